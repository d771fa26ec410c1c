/// Pre-decode gate for uploaded survey files.
///
/// Extension checking is the authoritative format gate; MIME sniffing
/// proved unreliable across survey vendors' tooling. Size and extension
/// are validated before any byte of the table is decoded.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_bytes: usize,
    allowed_extensions: Vec<String>,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: vec![".xlsx".to_string(), ".xls".to_string()],
        }
    }
}

impl UploadPolicy {
    pub fn new<I, S>(max_bytes: usize, allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            max_bytes,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|extension| extension.into().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Also admit an extra extension, e.g. `.csv` for the delimited-text
    /// adapter deployments.
    pub fn also_accepting(mut self, extension: &str) -> Self {
        self.allowed_extensions.push(extension.to_ascii_lowercase());
        self
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn validate(&self, file_name: &str, size_bytes: usize) -> Result<(), UploadError> {
        if size_bytes > self.max_bytes {
            return Err(UploadError::TooLarge {
                size_bytes,
                max_bytes: self.max_bytes,
            });
        }

        let extension = extension_of(file_name);
        if !self
            .allowed_extensions
            .iter()
            .any(|allowed| *allowed == extension)
        {
            return Err(UploadError::UnsupportedExtension {
                extension,
                allowed: self.allowed_extensions.join(", "),
            });
        }

        Ok(())
    }
}

fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(position) => file_name[position..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Upload rejections, each with a user-actionable message.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("file is {size_bytes} bytes, which exceeds the {max_bytes} byte upload limit")]
    TooLarge { size_bytes: usize, max_bytes: usize },
    #[error("unsupported file extension '{extension}'; expected one of: {allowed}")]
    UnsupportedExtension { extension: String, allowed: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_accepts_excel_extensions() {
        let policy = UploadPolicy::default();
        assert!(policy.validate("survey.xlsx", 1024).is_ok());
        assert!(policy.validate("NH-44 Q3.XLS", 1024).is_ok());
    }

    #[test]
    fn wrong_extension_is_rejected_with_the_offending_suffix() {
        let error = UploadPolicy::default()
            .validate("survey.pdf", 1024)
            .expect_err("pdf rejected");
        match error {
            UploadError::UnsupportedExtension { extension, .. } => {
                assert_eq!(extension, ".pdf");
            }
            other => panic!("expected extension rejection, got {other:?}"),
        }

        assert!(matches!(
            UploadPolicy::default().validate("no-extension", 10),
            Err(UploadError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn oversize_uploads_are_rejected_before_extension_checks() {
        let policy = UploadPolicy::default().with_max_bytes(1024);
        let error = policy
            .validate("survey.pdf", 2048)
            .expect_err("size gate first");
        assert!(matches!(error, UploadError::TooLarge { max_bytes: 1024, .. }));
    }

    #[test]
    fn extra_extensions_can_be_admitted() {
        let policy = UploadPolicy::default().also_accepting(".csv");
        assert!(policy.validate("export.csv", 100).is_ok());
        assert!(policy.validate("export.tsv", 100).is_err());
    }
}
