mod book;
mod id;

pub use self::book::Book;
pub use self::id::BookId;
