//! Draft submission controller.
//!
//! Owns a form draft between capture and submission: runs the photo through
//! the compression pipeline, offers the OCR assist its one chance to fill
//! blank fields, and gates submission on a single attachment state field
//! (`Idle | Compressing | Extracting | Ready`). That one field is the busy
//! flag - submission never infers busyness from anything else. Image and
//! extraction failures collect as soft warnings and never block the create
//! flow; a failed photo leaves the draft's image slot empty.

use crate::{
    config::policy::ReturnPolicy,
    core::{
        image::{self, EncodedImage, ImageError},
        ocr::{self, ExtractionWarning, OcrAssist},
        record,
        session::Session,
        validation::{self, RecordDraft},
    },
    entities::return_record,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use tracing::warn;

/// Where the draft's attachment flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentState {
    /// No attachment work pending
    Idle,
    /// Photo is being compressed
    Compressing,
    /// Compressed photo is at the extraction service
    Extracting,
    /// Attachment finished; an encoded image is ready to store
    Ready,
}

impl Default for AttachmentState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for AttachmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Idle => "idle",
            Self::Compressing => "compressing",
            Self::Extracting => "extracting",
            Self::Ready => "ready",
        };
        write!(f, "{text}")
    }
}

/// Non-fatal problem collected along the way to a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftWarning {
    /// The photo could not be processed; the draft has no image attached
    Image(ImageError),
    /// The OCR assist soft-failed; no fields were filled
    Extraction(ExtractionWarning),
    /// The record was created but the receipt image could not be stored
    ImageStoreFailed {
        /// Store failure description
        reason: String,
    },
}

impl std::fmt::Display for SoftWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image(e) => write!(f, "photo could not be attached: {e}"),
            Self::Extraction(w) => write!(f, "{w}"),
            Self::ImageStoreFailed { reason } => write!(
                f,
                "record saved, but the receipt photo could not be stored: {reason}"
            ),
        }
    }
}

/// A successful submission: the stored record plus any soft warnings
/// accumulated since the draft was started.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The created record
    pub record: return_record::Model,
    /// Soft warnings to show once, in order
    pub warnings: Vec<SoftWarning>,
}

/// Controller for one form draft.
#[derive(Default)]
pub struct DraftController {
    draft: RecordDraft,
    attachment: Option<EncodedImage>,
    state: AttachmentState,
    generation: u64,
    warnings: Vec<SoftWarning>,
}

impl DraftController {
    /// Starts an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a pre-filled draft (e.g. when editing).
    #[must_use]
    pub fn with_draft(draft: RecordDraft) -> Self {
        Self {
            draft,
            ..Self::default()
        }
    }

    /// The current draft contents.
    #[must_use]
    pub fn draft(&self) -> &RecordDraft {
        &self.draft
    }

    /// Mutable access for form field edits. Editing fields is allowed while
    /// an attachment is in flight; only submission is gated.
    pub fn draft_mut(&mut self) -> &mut RecordDraft {
        &mut self.draft
    }

    /// The attachment state field - the one and only busy flag.
    #[must_use]
    pub fn state(&self) -> AttachmentState {
        self.state
    }

    /// Whether an attachment operation is still in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            AttachmentState::Compressing | AttachmentState::Extracting
        )
    }

    /// The compressed image waiting to be stored, if any.
    #[must_use]
    pub fn attachment(&self) -> Option<&EncodedImage> {
        self.attachment.as_ref()
    }

    /// Soft warnings collected so far.
    #[must_use]
    pub fn warnings(&self) -> &[SoftWarning] {
        &self.warnings
    }

    /// Abandons any in-flight or finished attachment. Bumps the generation
    /// so a result still in flight is discarded instead of merged.
    pub fn cancel_attachment(&mut self) {
        self.generation += 1;
        self.attachment = None;
        self.state = AttachmentState::Idle;
    }

    /// Runs a captured photo through compression and, when an assist is
    /// provided, extraction.
    ///
    /// Compression failure clears the image slot and records a soft warning;
    /// the draft itself is untouched. Extraction results merge into the
    /// draft exactly once, via the fill-blanks reducer, and a run that was
    /// cancelled mid-flight commits nothing.
    pub async fn attach_photo(&mut self, raw: Vec<u8>, assist: Option<&OcrAssist>) {
        let generation = self.generation;
        self.state = AttachmentState::Compressing;

        let encoded = match image::compress(raw).await {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(%err, "receipt photo rejected");
                if self.generation == generation {
                    self.attachment = None;
                    self.state = AttachmentState::Idle;
                    self.warnings.push(SoftWarning::Image(err));
                }
                return;
            }
        };

        if self.generation != generation {
            return;
        }

        if let Some(assist) = assist {
            self.state = AttachmentState::Extracting;
            let extraction = assist.extract(&encoded).await;
            if self.generation != generation {
                return;
            }
            if let Some(warning) = extraction.warning {
                self.warnings.push(SoftWarning::Extraction(warning));
            }
            self.draft = ocr::apply_extraction(&self.draft, &extraction.fields);
        }

        self.attachment = Some(encoded);
        self.state = AttachmentState::Ready;
    }

    /// Validates and submits the draft.
    ///
    /// Refuses while an attachment is in flight ([`Error::DraftBusy`]).
    /// Validation and capacity errors block the write. After a successful
    /// record create, the receipt image is stored best-effort: a failure
    /// there becomes [`SoftWarning::ImageStoreFailed`] and the record
    /// stands. On success the controller resets to a fresh draft.
    pub async fn submit(
        &mut self,
        db: &DatabaseConnection,
        session: &Session,
        today: NaiveDate,
        policy: &ReturnPolicy,
    ) -> Result<Submission> {
        if self.is_busy() {
            return Err(Error::DraftBusy {
                state: self.state.to_string(),
            });
        }

        let validated = validation::validate(&self.draft, today, policy)?;
        record::ensure_capacity(db, session, policy).await?;
        let created = record::create_record(db, session, &validated, policy).await?;

        let mut warnings = std::mem::take(&mut self.warnings);
        let mut stored = created;

        if let Some(encoded) = &self.attachment {
            match record::set_receipt_image(db, session, stored.id, encoded).await {
                Ok(()) => {
                    // Re-read so the returned record carries has_receipt
                    stored = record::require_record(db, session, stored.id).await?;
                }
                Err(err) => {
                    warn!(%err, record_id = stored.id, "receipt image store failed");
                    warnings.push(SoftWarning::ImageStoreFailed {
                        reason: err.to_string(),
                    });
                }
            }
        }

        self.draft = RecordDraft::default();
        self.attachment = None;
        self.state = AttachmentState::Idle;
        self.generation += 1;

        Ok(Submission {
            record: stored,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ocr::{BackendError, ExtractionBackend, RawExtraction};
    use crate::test_utils::{setup_test_db, test_policy, test_session};
    use ::image::{ImageFormat, Rgb, RgbImage};
    use async_trait::async_trait;
    use sea_orm::ConnectionTrait;
    use std::{io::Cursor, sync::Arc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn photo_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(640, 480, Rgb([200, 200, 190]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn filled_draft() -> RecordDraft {
        RecordDraft {
            store_name: "Target".to_string(),
            price: "45.50".to_string(),
            purchase_date: "2025-01-10".to_string(),
            return_by_date: Some("2025-02-10".to_string()),
            returned_date: None,
        }
    }

    struct CannedBackend(RawExtraction);

    #[async_trait]
    impl ExtractionBackend for CannedBackend {
        async fn extract_fields(
            &self,
            _image_base64: &str,
        ) -> std::result::Result<RawExtraction, BackendError> {
            Ok(self.0.clone())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl ExtractionBackend for FailingBackend {
        async fn extract_fields(
            &self,
            _image_base64: &str,
        ) -> std::result::Result<RawExtraction, BackendError> {
            Err(BackendError::RateLimited)
        }
    }

    #[tokio::test]
    async fn test_submit_without_photo() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let mut controller = DraftController::with_draft(filled_draft());

        let submission = controller
            .submit(&db, &test_session(), today(), &test_policy())
            .await?;

        assert_eq!(submission.record.store_name, "Target");
        assert!(!submission.record.has_receipt);
        assert!(submission.warnings.is_empty());
        assert_eq!(controller.draft(), &RecordDraft::default());

        Ok(())
    }

    #[tokio::test]
    async fn test_attach_then_submit_stores_image() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let session = test_session();
        let mut controller = DraftController::with_draft(filled_draft());

        controller.attach_photo(photo_bytes(), None).await;
        assert_eq!(controller.state(), AttachmentState::Ready);
        assert!(controller.attachment().is_some());

        let submission = controller.submit(&db, &session, today(), &test_policy()).await?;
        assert!(submission.record.has_receipt);
        assert!(submission.warnings.is_empty());

        let stored = record::get_receipt_image(&db, &session, submission.record.id)
            .await?
            .unwrap();
        assert_eq!(stored.width, 640);

        Ok(())
    }

    #[tokio::test]
    async fn test_bad_photo_degrades_and_submission_still_succeeds() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let mut controller = DraftController::with_draft(filled_draft());

        controller
            .attach_photo(b"not an image at all".to_vec(), None)
            .await;
        assert_eq!(controller.state(), AttachmentState::Idle);
        assert!(controller.attachment().is_none());
        assert_eq!(controller.warnings().len(), 1);

        let submission = controller
            .submit(&db, &test_session(), today(), &test_policy())
            .await?;
        assert!(!submission.record.has_receipt);
        assert!(matches!(submission.warnings[0], SoftWarning::Image(_)));

        Ok(())
    }

    #[tokio::test]
    async fn test_ocr_fills_blanks_without_clobbering() -> crate::errors::Result<()> {
        let mut controller = DraftController::with_draft(RecordDraft {
            store_name: "Walmart".to_string(), // deliberate user input
            ..RecordDraft::default()
        });

        let assist = OcrAssist::new(Arc::new(CannedBackend(RawExtraction {
            store_name: Some("Target".to_string()),
            purchase_date: Some("01/10/2025".to_string()),
            return_by_date: Some("02/10/2025".to_string()),
            amount: Some(45.50),
        })));

        controller.attach_photo(photo_bytes(), Some(&assist)).await;

        assert_eq!(controller.state(), AttachmentState::Ready);
        assert_eq!(controller.draft().store_name, "Walmart");
        assert_eq!(controller.draft().price, "45.50");
        assert_eq!(controller.draft().purchase_date, "2025-01-10");

        Ok(())
    }

    #[tokio::test]
    async fn test_ocr_failure_is_soft_and_submission_identical() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let mut controller = DraftController::with_draft(filled_draft());

        let assist = OcrAssist::new(Arc::new(FailingBackend));
        controller.attach_photo(photo_bytes(), Some(&assist)).await;

        // The draft still has its photo and the failure became a warning
        assert_eq!(controller.state(), AttachmentState::Ready);
        assert!(controller.attachment().is_some());
        assert!(matches!(
            controller.warnings()[0],
            SoftWarning::Extraction(ExtractionWarning::RateLimited)
        ));

        let submission = controller
            .submit(&db, &test_session(), today(), &test_policy())
            .await?;
        assert_eq!(submission.record.store_name, "Target");

        Ok(())
    }

    #[tokio::test]
    async fn test_submit_refused_while_busy() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let mut controller = DraftController::with_draft(filled_draft());
        controller.state = AttachmentState::Extracting;

        let err = controller
            .submit(&db, &test_session(), today(), &test_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DraftBusy { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_discards_attachment() {
        let mut controller = DraftController::with_draft(filled_draft());
        controller.attach_photo(photo_bytes(), None).await;
        assert!(controller.attachment().is_some());

        controller.cancel_attachment();
        assert!(controller.attachment().is_none());
        assert_eq!(controller.state(), AttachmentState::Idle);
    }

    #[tokio::test]
    async fn test_image_store_failure_is_nonfatal() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let session = test_session();
        let mut controller = DraftController::with_draft(filled_draft());
        controller.attach_photo(photo_bytes(), None).await;

        // Make the image write fail while record writes keep working
        db.execute_unprepared("DROP TABLE receipt_images").await?;

        let submission = controller.submit(&db, &session, today(), &test_policy()).await?;

        assert!(matches!(
            submission.warnings[0],
            SoftWarning::ImageStoreFailed { .. }
        ));
        // The record itself stands
        let kept = record::require_record(&db, &session, submission.record.id).await?;
        assert_eq!(kept.store_name, "Target");

        Ok(())
    }

    #[tokio::test]
    async fn test_validation_failure_blocks_submit() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let mut controller = DraftController::new();
        controller.draft_mut().store_name = "Target".to_string();
        controller.draft_mut().price = "nope".to_string();
        controller.draft_mut().purchase_date = "2025-01-10".to_string();

        let err = controller
            .submit(&db, &test_session(), today(), &test_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        Ok(())
    }
}
