use exn::ResultExt;
use shelf_extract::Book;

use crate::error::{Error, ErrorKind};

#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: String,
    pub(crate) record: Vec<u8>,
}
impl TryFrom<&Book> for BookRow {
    type Error = Error;
    fn try_from(book: &Book) -> Result<Self, Self::Error> {
        Ok(Self {
            id: book.id.to_string(),
            record: serde_json::to_vec(book).or_raise(|| ErrorKind::InvalidData(book.id.to_string()))?,
        })
    }
}
impl TryFrom<BookRow> for Book {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let book: Book = serde_json::from_slice(&row.record).or_raise(|| ErrorKind::InvalidData(row.id.clone()))?;
        if book.id.as_str() != row.id {
            exn::bail!(ErrorKind::InvalidData(row.id));
        }
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn book() -> Book {
        Book::new("abcdef".parse().unwrap(), "/library/Artist/[hoge] comics.zip", OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn test_model_to_row() {
        let row = BookRow::try_from(&book()).unwrap();
        assert_eq!(row.id, "abcdef");
        let json: serde_json::Value = serde_json::from_slice(&row.record).unwrap();
        assert_eq!(json["Filename"], "[hoge] comics.zip");
        assert_eq!(json["Artists"], serde_json::json!(["hoge", "Artist"]));
        assert!(json.get("Path").is_none());
    }

    #[test]
    fn test_row_to_model() {
        let row = BookRow::try_from(&book()).unwrap();
        let decoded = Book::try_from(row).unwrap();
        assert_eq!(decoded.filename, "[hoge] comics.zip");
        assert_eq!(decoded.artists, vec!["hoge", "Artist"]);
    }

    #[test]
    fn test_row_with_garbage() {
        let row = BookRow { id: "abcdef".to_string(), record: b"not json".to_vec() };
        let err = Book::try_from(row).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(id) if id == "abcdef"));
    }

    #[test]
    fn test_row_with_mismatched_id() {
        let mut row = BookRow::try_from(&book()).unwrap();
        row.id = "012345".to_string();
        assert!(Book::try_from(row).is_err());
    }
}
