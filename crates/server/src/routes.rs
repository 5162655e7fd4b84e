use hyper::{Method, Request, Response};
use serde::Serialize;
use shelf_extract::{Book, BookId};
use shelf_pages::PageCache;
use shelf_registry::Registry;
use std::fmt::Display;
use tracing::{error, instrument};

use crate::response::{self, Body};

/// Shared state of every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Registry,
    pub pages: PageCache,
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    /// `/apis/books`
    Books,
    /// `/apis/books/{id}`
    Book(&'a str),
    /// `/books/{id}`
    Manifest(&'a str),
    /// `/books/{id}/thumbnail`
    Thumbnail(&'a str),
    /// `/books/{id}/{filename}`
    Page(&'a str, &'a str),
}
impl<'a> Route<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let segments: Vec<&str> = path.strip_prefix('/')?.split('/').collect();
        match segments.as_slice() {
            ["apis", "books"] => Some(Self::Books),
            ["apis", "books", id] => Some(Self::Book(id)),
            ["books", id] => Some(Self::Manifest(id)),
            ["books", id, "thumbnail"] => Some(Self::Thumbnail(id)),
            ["books", id, filename] => Some(Self::Page(id, filename)),
            _ => None,
        }
    }
}

/// What went wrong while answering a request.
enum Failure {
    NotFound,
    Internal(String),
}
impl Failure {
    fn internal(err: impl Display) -> Self {
        Self::Internal(err.to_string())
    }
}

type Handled = std::result::Result<Response<Body>, Failure>;

/// Answer a single request. Only the method and path are looked at.
#[instrument(skip_all, fields(method = %req.method(), path = req.uri().path()))]
pub async fn handle<B>(state: &AppState, req: Request<B>) -> Response<Body> {
    let Some(route) = Route::parse(req.uri().path()) else {
        return response::not_found();
    };
    if req.method() != Method::GET {
        return response::method_not_allowed();
    }
    let result = match route {
        Route::Books => books(state).await,
        Route::Book(id) => book(state, id).await,
        Route::Manifest(id) => manifest(state, id).await,
        Route::Thumbnail(id) => thumbnail(state, id).await,
        Route::Page(id, filename) => page(state, id, filename).await,
    };
    match result {
        Ok(response) => response,
        Err(Failure::NotFound) => response::not_found(),
        Err(Failure::Internal(message)) => {
            error!(error = %message, "request failed");
            response::internal_error(message)
        },
    }
}

async fn find_book(state: &AppState, id: &str) -> std::result::Result<Book, Failure> {
    // Anything that isn't a valid identifier can't name a book.
    let id: BookId = id.parse().map_err(|_| Failure::NotFound)?;
    match state.registry.get(&id).await {
        Ok(Some(book)) => Ok(book),
        Ok(None) => Err(Failure::NotFound),
        Err(err) => Err(Failure::internal(&*err)),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Handled {
    serde_json::to_vec(value).map(response::json).map_err(Failure::internal)
}

async fn books(state: &AppState) -> Handled {
    let books = state.registry.list().await.map_err(|err| Failure::internal(&*err))?;
    to_json(&*books)
}

async fn book(state: &AppState, id: &str) -> Handled {
    to_json(&find_book(state, id).await?)
}

async fn manifest(state: &AppState, id: &str) -> Handled {
    let book = find_book(state, id).await?;
    match state.pages.get(&book).await {
        Ok(Some(manifest)) => to_json(&manifest),
        Ok(None) => Err(Failure::NotFound),
        Err(err) => Err(Failure::internal(&*err)),
    }
}

async fn thumbnail(state: &AppState, id: &str) -> Handled {
    let book = find_book(state, id).await?;
    let path = state.pages.thumbnail(&book).await.map_err(|err| match &*err {
        kind if kind.is_not_found() => Failure::NotFound,
        kind => Failure::internal(kind),
    })?;
    let data = read(&path).await?;
    Ok(response::ok("image/jpeg", data))
}

async fn page(state: &AppState, id: &str, filename: &str) -> Handled {
    let book = find_book(state, id).await?;
    let path = state.pages.resolve(&book, filename).map_err(|_| Failure::NotFound)?;
    let data = read(&path).await?;
    Ok(response::ok(response::content_type(filename), data))
}

async fn read(path: &std::path::Path) -> std::result::Result<Vec<u8>, Failure> {
    tokio::fs::read(path).await.map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Failure::NotFound,
        _ => Failure::internal(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use hyper::header::CONTENT_TYPE;
    use rstest::rstest;
    use shelf_registry::Database;
    use std::io::Write;
    use std::path::Path;
    use time::OffsetDateTime;

    const ID: &str = "abcdef0123456789";

    #[rstest]
    #[case("/apis/books", Some(Route::Books))]
    #[case("/apis/books/abc", Some(Route::Book("abc")))]
    #[case("/books/abc", Some(Route::Manifest("abc")))]
    #[case("/books/abc/thumbnail", Some(Route::Thumbnail("abc")))]
    #[case("/books/abc/0.jpg", Some(Route::Page("abc", "0.jpg")))]
    #[case("/", None)]
    #[case("/apis", None)]
    #[case("/books", None)]
    #[case("/books/abc/0.jpg/more", None)]
    #[case("/apis/books/abc/extra", None)]
    fn test_route_parsing(#[case] path: &str, #[case] expected: Option<Route<'static>>) {
        assert_eq!(Route::parse(path), expected);
    }

    fn png() -> Vec<u8> {
        let mut data = std::io::Cursor::new(Vec::new());
        image::RgbImage::from_pixel(50, 50, image::Rgb([200, 100, 0]))
            .write_to(&mut data, image::ImageFormat::Png)
            .unwrap();
        data.into_inner()
    }

    async fn state(temp_dir: &Path) -> AppState {
        let db = Database::connect_in_memory().await.unwrap();
        AppState { registry: Registry::from(&db), pages: PageCache::new(temp_dir.join("cache")) }
    }

    /// Registers a book and extracts a two-page archive for it.
    async fn populate(state: &AppState, temp_dir: &Path) -> Book {
        let source = temp_dir.join("comics.zip");
        let mut zip = zip::ZipWriter::new(std::fs::File::create(&source).unwrap());
        zip.start_file("001.png", zip::write::SimpleFileOptions::default()).unwrap();
        zip.write_all(&png()).unwrap();
        zip.start_file("002.jpg", zip::write::SimpleFileOptions::default()).unwrap();
        zip.write_all(b"jpeg bytes").unwrap();
        zip.finish().unwrap();
        let book = Book::new(ID.parse().unwrap(), "/library/Artist/[hoge] comics.zip", OffsetDateTime::UNIX_EPOCH);
        state.pages.generate(&source, &book).await.unwrap();
        state.registry.register(&book).await.unwrap();
        book
    }

    async fn get(state: &AppState, path: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = handle(state, Request::get(path).body(()).unwrap()).await;
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = state(temp_dir.path()).await;
        let (status, content_type, body) = get(&state, "/apis/books").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, b"[]");
    }

    #[tokio::test]
    async fn test_books() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = state(temp_dir.path()).await;
        populate(&state, temp_dir.path()).await;

        let (status, _, body) = get(&state, "/apis/books").await;
        assert_eq!(status, StatusCode::OK);
        let books: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(books[0]["ID"], ID);
        assert_eq!(books[0]["Artists"], serde_json::json!(["hoge", "Artist"]));

        let (status, _, body) = get(&state, &format!("/apis/books/{ID}")).await;
        assert_eq!(status, StatusCode::OK);
        let book: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(book["Filename"], "[hoge] comics.zip");
    }

    #[rstest]
    #[case::unknown_book("/apis/books/ffff")]
    #[case::invalid_id("/apis/books/not-hex")]
    #[case::unknown_manifest("/books/ffff")]
    #[case::unknown_page("/books/ffff/0.png")]
    #[case::unknown_route("/nowhere")]
    #[tokio::test]
    async fn test_not_found(#[case] path: &str) {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = state(temp_dir.path()).await;
        populate(&state, temp_dir.path()).await;
        let (status, _, body) = get(&state, path).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Not Found");
    }

    #[tokio::test]
    async fn test_manifest_and_pages() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = state(temp_dir.path()).await;
        populate(&state, temp_dir.path()).await;

        let (status, _, body) = get(&state, &format!("/books/{ID}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"filenames":["0.png","1.jpg"]}"#);

        let (status, content_type, body) = get(&state, &format!("/books/{ID}/1.jpg")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(body, b"jpeg bytes");

        let (status, content_type, _) = get(&state, &format!("/books/{ID}/0.png")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/png"));

        for missing in ["7.jpg", "..", "%2e%2e"] {
            let (status, _, _) = get(&state, &format!("/books/{ID}/{missing}")).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{missing}");
        }
    }

    #[tokio::test]
    async fn test_registered_but_not_generated() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = state(temp_dir.path()).await;
        let book = Book::new(ID.parse().unwrap(), "/library/comics.zip", OffsetDateTime::UNIX_EPOCH);
        state.registry.register(&book).await.unwrap();
        let (status, _, _) = get(&state, &format!("/books/{ID}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = get(&state, &format!("/books/{ID}/thumbnail")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_thumbnail() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = state(temp_dir.path()).await;
        let book = populate(&state, temp_dir.path()).await;
        let (status, content_type, body) = get(&state, &format!("/books/{ID}/thumbnail")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/jpeg"));
        let thumbnail = image::load_from_memory(&body).unwrap();
        assert_eq!((thumbnail.width(), thumbnail.height()), (364, 514));
        assert!(state.pages.dir(&book).join("thumbnail.jpg").exists());
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_an_internal_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = state(temp_dir.path()).await;
        let book = populate(&state, temp_dir.path()).await;
        std::fs::write(state.pages.index_path(&book), b"{").unwrap();
        let (status, _, body) = get(&state, &format!("/books/{ID}")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(String::from_utf8(body).unwrap().starts_with("invalid manifest"));
    }

    #[tokio::test]
    async fn test_only_get_is_allowed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = state(temp_dir.path()).await;
        let response = handle(&state, Request::post("/apis/books").body(()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
