pub mod attachments;
pub mod console;
pub mod context;
pub mod export;
pub mod history;
pub mod invoker;
pub mod models;
pub mod session;
pub mod settings;
pub mod taxonomy;
pub mod tutor;

pub use context::EducationContext;
pub use session::{Message, Role, Session};
pub use taxonomy::Level;
pub use tutor::{TurnInput, TurnOutcome, TurnResult, Tutor};
