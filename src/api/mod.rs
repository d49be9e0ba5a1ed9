/// Backend API module
///
/// Everything that talks to the remote vision-analysis service lives
/// here (client.rs). The rest of the app only sees plain async calls
/// returning text or a RequestError.

pub mod client;
