//! Export trigger – lets any component ask for a PDF without holding a
//! reference to the exporter.
//!
//! The sending half is cheap to clone and hand out; the receiving half is
//! owned by whoever services exports (see `pipeline::handle_request`).

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::cv_data::{CvData, Translations};

/// One "generate export" request.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub data: CvData,
    pub language: String,
    pub translations: Translations,
    pub template_id: String,
}

#[derive(Debug, Clone)]
pub struct ExportTrigger {
    tx: Sender<ExportRequest>,
}

impl ExportTrigger {
    /// Queue a request. Returns `false` when nobody is listening any more.
    pub fn fire(&self, request: ExportRequest) -> bool {
        let template_id = request.template_id.clone();
        match self.tx.send(request) {
            Ok(()) => {
                log::debug!("export requested for template {template_id}");
                true
            }
            Err(_) => {
                log::warn!("export request for {template_id} dropped: no receiver");
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct ExportRequests {
    rx: Receiver<ExportRequest>,
}

impl ExportRequests {
    pub fn try_next(&self) -> Option<ExportRequest> {
        match self.rx.try_recv() {
            Ok(req) => Some(req),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next request.
    pub fn next_timeout(&self, timeout: Duration) -> Option<ExportRequest> {
        match self.rx.recv_timeout(timeout) {
            Ok(req) => Some(req),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Everything queued right now.
    pub fn drain(&self) -> Vec<ExportRequest> {
        self.rx.try_iter().collect()
    }

    /// Blocks until every trigger is dropped.
    pub fn iter(&self) -> impl Iterator<Item = ExportRequest> + '_ {
        self.rx.iter()
    }
}

pub fn channel() -> (ExportTrigger, ExportRequests) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ExportTrigger { tx }, ExportRequests { rx })
}
