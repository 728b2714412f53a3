//! `multipart/form-data` bodies for uploads.
//!
//! A form is a list of scalar `(name, value)` fields plus at most one file.
//! The file is always sent under the form field name `file`.

use uuid::Uuid;

/// Form field name the attached file is sent under.
pub const FILE_FIELD: &str = "file";

/// One file attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Scalar fields and an optional file, in send order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((name.into(), value.to_string()));
        self
    }

    pub fn file(mut self, file: FilePart) -> Self {
        self.file = Some(file);
        self
    }

    /// Encode with a fresh boundary. Returns the `Content-Type` header value
    /// and the body.
    pub fn encode(&self) -> (String, Vec<u8>) {
        self.encode_with_boundary(&format!("Boundary-{}", Uuid::new_v4()))
    }

    pub fn encode_with_boundary(&self, boundary: &str) -> (String, Vec<u8>) {
        let mut body = Vec::new();

        for (name, value) in &self.fields {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    escape_quoted(name)
                )
                .as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }

        if let Some(file) = &self.file {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{FILE_FIELD}\"; filename=\"{}\"\r\n",
                    escape_quoted(&file.file_name)
                )
                .as_bytes(),
            );
            let mime_type: String = file.mime_type.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
            body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
            body.extend_from_slice(&file.bytes);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        (format!("multipart/form-data; boundary={boundary}"), body)
    }
}

/// Percent-encode the characters that would end a quoted header parameter
/// or start a new header line, the way browsers encode form names.
fn escape_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            c => escaped.push(c),
        }
    }
    escaped
}
