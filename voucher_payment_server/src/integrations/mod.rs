pub mod mailer;
pub mod sheets;

pub use mailer::Mailer;
pub use sheets::SheetSink;
