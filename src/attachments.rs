use crate::errors::{AppError, AppResult};
use crate::models::Attachment;
use std::io::Write;
use std::path::Path;
use tempfile::TempPath;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Audio,
    Document,
}

impl AttachmentKind {
    pub fn from_mime(mime_type: &str) -> AttachmentKind {
        if mime_type.starts_with("image/") {
            AttachmentKind::Image
        } else if mime_type.starts_with("audio/") {
            AttachmentKind::Audio
        } else {
            AttachmentKind::Document
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "🖼",
            AttachmentKind::Audio => "♫",
            AttachmentKind::Document => "📄",
        }
    }
}

/// Reads a user-selected file into an attachment.
pub async fn read_attachment(path: &Path) -> AppResult<Attachment> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::InvalidInput(format!("{} is not a file", path.display())))?;
    let blob = tokio::fs::read(path)
        .await
        .map_err(|err| AppError::Io(format!("{}: {}", path.display(), err)))?;
    let mime_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
    tracing::debug!(name = %name, mime = %mime_type, bytes = blob.len(), "attachment read");
    Ok(Attachment {
        name,
        mime_type,
        blob,
    })
}

/// A temporary file holding an attachment's bytes. The file is removed when
/// the handle is dropped; handles are never stored.
#[derive(Debug)]
pub struct AttachmentHandle {
    pub name: String,
    pub kind: AttachmentKind,
    path: TempPath,
}

impl AttachmentHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn path_buf(&self) -> std::path::PathBuf {
        self.path.to_path_buf()
    }
}

pub fn materialize(attachment: &Attachment) -> AppResult<AttachmentHandle> {
    let safe_name = attachment.name.replace(['/', '\\'], "_");
    let mut file = tempfile::Builder::new()
        .prefix("tasknavy-")
        .suffix(&format!("-{}", safe_name))
        .tempfile()?;
    file.write_all(&attachment.blob)?;
    file.flush()?;
    Ok(AttachmentHandle {
        name: attachment.name.clone(),
        kind: AttachmentKind::from_mime(&attachment.mime_type),
        path: file.into_temp_path(),
    })
}
