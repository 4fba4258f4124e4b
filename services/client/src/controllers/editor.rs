//! Post write and edit

use std::sync::{Mutex, PoisonError};

use common::ApiResult;
use tracing::{info, warn};

use crate::api::BoardApi;
use crate::controllers::{Feedback, Field, Navigation, SubmitGuard, Submission};
use crate::models::{ImageFile, ImageId, ImageUpload, NewPost, PostId, PostUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Write,
    Edit(PostId),
}

/// Form contents
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    /// Newly selected image
    pub image: Option<ImageFile>,
    /// Remove the post's current image
    pub remove_image: bool,
}

/// An upload done for this editor, kept so a failed post call can be
/// resubmitted without uploading the same file again
#[derive(Debug, Clone)]
struct UploadedImage {
    source: ImageFile,
    upload: ImageUpload,
}

pub struct PostEditorController {
    api: BoardApi,
    mode: EditorMode,
    existing_image: Option<ImageId>,
    uploaded: Mutex<Option<UploadedImage>>,
    submitting: SubmitGuard,
}

impl PostEditorController {
    pub fn write(api: BoardApi) -> Self {
        Self {
            api,
            mode: EditorMode::Write,
            existing_image: None,
            uploaded: Mutex::new(None),
            submitting: SubmitGuard::default(),
        }
    }

    /// Load a post for editing; returns the controller and the prefilled draft
    pub async fn edit(api: BoardApi, post_id: PostId) -> ApiResult<(Self, PostDraft)> {
        let post = api.get_post(post_id).await?;
        let draft = PostDraft {
            title: post.title,
            content: post.content,
            image: None,
            remove_image: false,
        };
        let controller = Self {
            api,
            mode: EditorMode::Edit(post_id),
            existing_image: post.image_id,
            uploaded: Mutex::new(None),
            submitting: SubmitGuard::default(),
        };
        Ok((controller, draft))
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_busy()
    }

    /// Upload the draft's image if it has not been uploaded yet
    async fn upload(&self, image: &ImageFile) -> Result<ImageId, Feedback> {
        let reusable = self
            .uploaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|uploaded| &uploaded.source == image)
            .map(|uploaded| uploaded.upload.image_id);
        if let Some(image_id) = reusable {
            info!("Reusing uploaded image {}", image_id);
            return Ok(image_id);
        }

        match self.api.upload_image(image).await {
            Ok(upload) => {
                let image_id = upload.image_id;
                *self.uploaded.lock().unwrap_or_else(PoisonError::into_inner) = Some(UploadedImage {
                    source: image.clone(),
                    upload,
                });
                Ok(image_id)
            }
            Err(e) => {
                warn!("Image upload failed: {}", e);
                Err(Feedback::field(Field::Image, e.user_message()))
            }
        }
    }

    /// Submit the draft
    ///
    /// The image, if any, is uploaded first; the post is then created or
    /// updated. On success the caller goes to the post.
    pub async fn submit(&self, draft: &PostDraft) -> Submission<Navigation> {
        let Some(_ticket) = self.submitting.try_begin() else {
            return Submission::Ignored;
        };

        let title = draft.title.trim();
        let content = draft.content.trim();
        if title.is_empty() {
            return Submission::Rejected(Feedback::field(Field::Title, "Please enter a title."));
        }
        if content.is_empty() {
            return Submission::Rejected(Feedback::field(Field::Content, "Please enter the content."));
        }

        let new_image = match (&draft.image, draft.remove_image) {
            (Some(image), false) => match self.upload(image).await {
                Ok(image_id) => Some(image_id),
                Err(feedback) => return Submission::Rejected(feedback),
            },
            _ => None,
        };

        match self.mode {
            EditorMode::Write => {
                let post = NewPost {
                    title: title.to_string(),
                    content: content.to_string(),
                    image_id: new_image,
                };
                match self.api.create_post(&post).await {
                    Ok(created) => {
                        info!("Created post {}", created.post_id);
                        Submission::Completed(Navigation::PostDetail(created.post_id))
                    }
                    Err(e) => Submission::from_error(&e),
                }
            }
            EditorMode::Edit(post_id) => {
                let update = PostUpdate {
                    title: title.to_string(),
                    content: content.to_string(),
                    image_id: if draft.remove_image {
                        None
                    } else {
                        new_image.or(self.existing_image)
                    },
                    remove_image: draft.remove_image,
                };
                match self.api.update_post(post_id, &update).await {
                    Ok(()) => {
                        info!("Updated post {}", post_id);
                        Submission::Completed(Navigation::PostDetail(post_id))
                    }
                    Err(e) => Submission::from_error(&e),
                }
            }
        }
    }
}
