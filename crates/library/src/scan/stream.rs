use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use shelf_storage::WalkOptions;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::Context;
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::scan::error::{ErrorKind as ScanErrorKind, Result as ScanResult};
use crate::scan::file::{Scan, is_candidate, scan_file_inner};

/// Progress events emitted by [`scan`].
///
/// [`Started`](Self::Started) comes first, then one
/// [`Scanned`](Self::Scanned) per archive and finally
/// [`Complete`](Self::Complete). Failures for a single file are yielded as
/// `Err` items in between and don't end the stream; cancellation does, with
/// a final [`Canceled`](LibraryErrorKind::Canceled) error instead of
/// `Complete`.
#[derive(Debug)]
pub enum ScanEvent {
    Started,
    Scanned(Box<Scan>),
    Complete,
}

/// Walk the library and ingest every candidate archive, one at a time.
///
/// `cancel` is checked before every entry of the walk. A file that is being
/// processed when it trips is finished first.
pub fn scan(ctx: &Context, cancel: CancellationToken) -> impl Stream<Item = LibraryResult<ScanEvent>> + '_ {
    stream! {
        for await event in scan_inner(ctx, cancel) {
            yield event.map_err(|err| {
                let kind = match &*err {
                    ScanErrorKind::Canceled => LibraryErrorKind::Canceled,
                    _ => LibraryErrorKind::Scan,
                };
                err.raise(kind)
            });
        }
    }
}

fn scan_inner(ctx: &Context, cancel: CancellationToken) -> impl Stream<Item = ScanResult<ScanEvent>> + '_ {
    stream!({
        yield Ok(ScanEvent::Started);
        let options = WalkOptions { skip_hidden: ctx.options.skip_hidden };
        let mut files = ctx.backend.walk(options);
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                next = files.next() => Some(next),
            };
            let Some(next) = next else {
                info!("scan canceled");
                yield Err(exn::Exn::from(ScanErrorKind::Canceled));
                return;
            };
            let file = match next {
                Some(Ok(file)) => file,
                Some(Err(err)) => {
                    yield Err(err).or_raise(|| ScanErrorKind::Storage);
                    continue;
                },
                None => break,
            };
            if !is_candidate(&file, &ctx.options) {
                debug!(path = %file.path.display(), "skipping file");
                continue;
            }
            yield scan_file_inner(ctx, &file).await.map(|scan| ScanEvent::Scanned(Box::new(scan)));
        }
        yield Ok(ScanEvent::Complete);
    })
}
