pub mod models;

pub use models::events::{FlightResult, ResultEvent};
pub use models::progress::{FrameKind, ProgressFrame, SearchStatus};
pub use models::search::SearchRequest;
