// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use arboard::Clipboard;
use std::path::PathBuf;
use std::time::Duration;
use sublines_app::ExportArtifact;
use tracing::debug;

pub struct TuiRuntime {
    // Opened on first copy and kept alive so the selection owner outlives
    // the write on X11.
    clipboard: Option<Clipboard>,
    export_dir: PathBuf,
    copy_ack: Duration,
}

impl TuiRuntime {
    pub fn new(export_dir: PathBuf, copy_ack: Duration) -> Self {
        Self {
            clipboard: None,
            export_dir,
            copy_ack,
        }
    }

    fn clipboard(&mut self) -> Result<&mut Clipboard> {
        if self.clipboard.is_none() {
            let clipboard =
                Clipboard::new().map_err(|error| anyhow!("open system clipboard: {error}"))?;
            self.clipboard = Some(clipboard);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| anyhow!("system clipboard unavailable"))
    }
}

impl sublines_tui::AppRuntime for TuiRuntime {
    fn copy_to_clipboard(&mut self, text: &str) -> Result<()> {
        let result = self
            .clipboard()?
            .set_text(text.to_owned())
            .context("write text to clipboard");
        if result.is_err() {
            // A broken handle stays broken; reopen on the next copy.
            self.clipboard = None;
        }
        debug!(chars = text.chars().count(), ok = result.is_ok(), "clipboard write");
        result
    }

    fn save_export(&mut self, artifact: &ExportArtifact) -> Result<PathBuf> {
        sublines_data::write_export(&self.export_dir, artifact)
    }

    fn copy_ack_duration(&self) -> Duration {
        self.copy_ack
    }
}
