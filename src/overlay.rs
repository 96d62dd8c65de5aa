use serde::Serialize;

use crate::models::{FraudResult, JobRecord};

/// The single modal currently presented over the browser, if any.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum Overlay {
    #[default]
    None,
    Detail(JobRecord),
    Result(FraudResult),
}

/// Holds at most one overlay. Opening always replaces, there is no stack.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverlayCoordinator {
    current: Overlay,
}

impl OverlayCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Overlay {
        &self.current
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.current, Overlay::None)
    }

    pub fn open_detail(&mut self, record: JobRecord) {
        self.current = Overlay::Detail(record);
    }

    pub fn open_result(&mut self, result: FraudResult) {
        self.current = Overlay::Result(result);
    }

    pub fn close(&mut self) {
        self.current = Overlay::None;
    }
}
