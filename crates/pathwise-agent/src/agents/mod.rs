mod chat;
mod interactive;
mod locate;
mod summary;

pub use chat::ChatAgent;
pub use interactive::InteractiveAgent;
pub use locate::LocateAgent;
pub use summary::SummaryAgent;
