use std::sync::Arc;

use nb_core::ccode::CcodeDecoder;
use nb_core::filter::NotificationFilter;
use nb_core::record::{Book, BookList};

use crate::notifier::Notifier;
use crate::openbd::DetailFetcher;
use crate::recorder::Recorder;

/// Everything one batch needs. Cloned into each per-book task.
#[derive(Clone)]
pub struct Pipeline {
    pub fetcher: Arc<dyn DetailFetcher>,
    pub decoder: Arc<CcodeDecoder>,
    pub filter: Arc<NotificationFilter>,
    pub notifier: Arc<dyn Notifier>,
    /// `None` skips both the recorded-ISBN lookup and saving.
    pub recorder: Option<Arc<dyn Recorder>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub feed_books: usize,
    pub new_books: usize,
    pub notified: usize,
}

impl Pipeline {
    pub async fn process(&self, list: BookList) -> RunSummary {
        let feed_books = list.books.len();
        let list = self.skip_recorded(list).await;
        let new_books = list.books.len();
        log::info!("{} of {} book(s) are new", new_books, feed_books);

        let upload_date = list.upload_date;
        let handles: Vec<_> = list
            .books
            .into_iter()
            .map(|book| {
                let pipeline = self.clone();
                tokio::spawn(async move { pipeline.process_book(book).await })
            })
            .collect();

        let mut books = Vec::with_capacity(handles.len());
        let mut notified = 0usize;
        for handle in handles {
            match handle.await {
                Ok((book, sent)) => {
                    if sent {
                        notified += 1;
                    }
                    books.push(book);
                }
                Err(e) => log::error!("Book task failed: {}", e),
            }
        }

        let processed = BookList { upload_date, books };
        if let Some(recorder) = &self.recorder {
            if let Err(e) = recorder.save_records(&processed).await {
                log::error!("Failed to save records: {}", e);
            }
        }

        RunSummary {
            feed_books,
            new_books,
            notified,
        }
    }

    async fn skip_recorded(&self, list: BookList) -> BookList {
        let Some(recorder) = &self.recorder else {
            return list;
        };
        match recorder.recorded_isbns(list.upload_date.date_naive()).await {
            Ok(isbns) => list.filter_out(&isbns),
            Err(e) => {
                log::warn!("Failed to look up recorded books, treating all as new: {}", e);
                list
            }
        }
    }

    /// Enrich, classify and filter one book, notifying on a match.
    /// Returns the enriched book and whether a notification went out.
    async fn process_book(&self, mut book: Book) -> (Book, bool) {
        match self.fetcher.fetch_detail(&book.isbn).await {
            Ok(Some(detail)) => book.update_details(&detail),
            Ok(None) => log::warn!("No details found for {}", book.isbn),
            Err(e) => log::warn!("Failed to fetch details for {}: {}", book.isbn, e),
        }

        if !book.ccode.is_empty() {
            match self.decoder.decode(&book.ccode) {
                Ok(subject) => book.update_subject(&subject),
                Err(e) => log::warn!("Cannot decode C-code of {}: {}", book.isbn, e),
            }
        }

        if !self.filter.is_match(&book) {
            return (book, false);
        }

        match self.notifier.post(&book.notification_message()).await {
            Ok(()) => {
                log::debug!("Notified {}", book.isbn);
                (book, true)
            }
            Err(e) => {
                log::error!("Failed to notify {}: {}", book.isbn, e);
                (book, false)
            }
        }
    }
}
