use anyhow::{bail, Result};

/// Availability of one external capability, checked once at startup.
#[derive(Debug)]
pub struct Capability {
    pub name: &'static str,
    pub available: bool,
    pub detail: String,
}

#[derive(Debug)]
pub struct EnvReport {
    pub capabilities: Vec<Capability>,
}

impl EnvReport {
    pub fn print(&self) {
        for cap in &self.capabilities {
            let status = if cap.available { "ok" } else { "MISSING" };
            println!("{:<24} {:<8} {}", cap.name, status, cap.detail);
        }
    }

    pub fn ocr_available(&self) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.name == "tesseract" && c.available)
    }
}

/// Probe every capability the batch jobs rely on.
pub fn check() -> EnvReport {
    EnvReport {
        capabilities: vec![
            check_tesseract(),
            check_japanese_data(),
            Capability {
                name: "pdf-extraction",
                available: true,
                detail: "built in".to_string(),
            },
        ],
    }
}

/// Fail fast with an actionable message when OCR cannot run.
pub fn require_ocr() -> Result<()> {
    let report = check();
    if !report.ocr_available() {
        let detail = report
            .capabilities
            .iter()
            .find(|c| c.name == "tesseract")
            .map(|c| c.detail.as_str())
            .unwrap_or("engine missing");
        bail!(
            "OCR is unavailable: {}. Install Tesseract (with jpn language data) \
             and build with --features tesseract.",
            detail
        );
    }
    Ok(())
}

#[cfg(feature = "tesseract")]
fn check_tesseract() -> Capability {
    let (available, detail) = match leptess::LepTess::new(None, "eng") {
        Ok(_) => (true, "engine initialized".to_string()),
        Err(e) => (false, format!("engine failed to initialize: {}", e)),
    };
    Capability {
        name: "tesseract",
        available,
        detail,
    }
}

#[cfg(not(feature = "tesseract"))]
fn check_tesseract() -> Capability {
    Capability {
        name: "tesseract",
        available: false,
        detail: "built without the `tesseract` feature".to_string(),
    }
}

#[cfg(feature = "tesseract")]
fn check_japanese_data() -> Capability {
    let (available, detail) = match leptess::LepTess::new(None, "jpn") {
        Ok(_) => (true, "jpn language data found".to_string()),
        Err(e) => (false, format!("jpn language data missing: {}", e)),
    };
    Capability {
        name: "tesseract-jpn",
        available,
        detail,
    }
}

#[cfg(not(feature = "tesseract"))]
fn check_japanese_data() -> Capability {
    Capability {
        name: "tesseract-jpn",
        available: false,
        detail: "built without the `tesseract` feature".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_always_lists_all_capabilities() {
        let report = check();
        let names: Vec<&str> = report.capabilities.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["tesseract", "tesseract-jpn", "pdf-extraction"]);
    }

    #[test]
    fn pdf_extraction_is_always_available() {
        let report = check();
        assert!(report
            .capabilities
            .iter()
            .find(|c| c.name == "pdf-extraction")
            .unwrap()
            .available);
    }

    #[test]
    fn require_ocr_agrees_with_report() {
        assert_eq!(check().ocr_available(), require_ocr().is_ok());
    }

    #[cfg(not(feature = "tesseract"))]
    #[test]
    fn ocr_unavailable_without_feature() {
        assert!(!check().ocr_available());
        let err = require_ocr().unwrap_err().to_string();
        assert!(err.contains("tesseract"));
    }
}
