use exn::ResultExt;
use shelf_extract::{Book, BookId};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::BookRow;

/// Outcome of [`Registry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The book was new and has been stored.
    Registered,
    /// A book with the same identifier was already stored; nothing changed.
    AlreadyRegistered,
}

#[derive(Debug, Default)]
struct Listing {
    /// Bumped by every successful insert.
    generation: u64,
    books: Option<Arc<[Book]>>,
}

impl Listing {
    fn invalidate(&mut self) {
        self.generation += 1;
        self.books = None;
    }

    /// Cache `books`, read while the listing was at `generation`. Dropped if
    /// a registration committed since: it may be missing from `books`.
    fn publish(&mut self, generation: u64, books: &Arc<[Book]>) {
        if self.generation == generation {
            self.books = Some(Arc::clone(books));
        }
    }
}

/// Deduplicated catalog of books.
///
/// Cheap to clone: clones share the connection pool and the in-memory
/// listing.
#[derive(Debug, Clone)]
pub struct Registry {
    pool: SqlitePool,
    listing: Arc<Mutex<Listing>>,
}
impl From<&Database> for Registry {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), listing: Arc::default() }
    }
}
impl Registry {
    fn listing(&self) -> MutexGuard<'_, Listing> {
        // The guarded state is always left consistent, so a panic elsewhere
        // doesn't make it unusable.
        self.listing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `book` unless its identifier is already known.
    ///
    /// The first registration of an identifier wins: a later book with the
    /// same identifier (a copy of the archive somewhere else in the library,
    /// say) is logged and dropped without touching the stored record.
    #[instrument(skip_all, fields(id = %book.id, filename = %book.filename))]
    pub async fn register(&self, book: &Book) -> Result<Registration> {
        let row = BookRow::try_from(book)?;
        let result = sqlx::query(include_str!("../queries/insert_book.sql"))
            .bind(&row.id)
            .bind(&row.record)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            info!("book already registered");
            return Ok(Registration::AlreadyRegistered);
        }
        self.listing().invalidate();
        debug!("book registered");
        Ok(Registration::Registered)
    }

    /// Look up a single book.
    ///
    /// # Errors
    /// [`InvalidData`](ErrorKind::InvalidData) if the stored record can't be
    /// decoded.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &BookId) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Book::try_from).transpose()
    }

    /// Every book, most recently modified first.
    ///
    /// The result is kept in memory until the next successful
    /// [`register`](Self::register). Records that fail to decode are logged
    /// and left out.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Arc<[Book]>> {
        let generation = {
            let listing = self.listing();
            if let Some(books) = &listing.books {
                return Ok(Arc::clone(books));
            }
            listing.generation
        };
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_books.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut books: Vec<Book> = rows
            .into_iter()
            .filter_map(|row| match Book::try_from(row) {
                Ok(book) => Some(book),
                Err(err) => {
                    warn!(error = %*err, "skipping unreadable catalog record");
                    None
                },
            })
            .collect();
        books.sort_by(|a, b| b.mod_time.cmp(&a.mod_time));
        let books: Arc<[Book]> = books.into();
        self.listing().publish(generation, &books);
        Ok(books)
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_books.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
