//! Subcommand implementations, one per screen action

use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use board_client::BoardClient;
use board_client::controllers::{
    FeedController, FeedLoad, LoginController, Navigation, PostDetailController,
    PostDraft, PostEditorController, ProfileController, RegisterController, Submission,
};
use board_client::models::{ImageFile, ProfileImageChange, Registration};
use chrono::Utc;
use tracing::debug;

use crate::render;

/// Unwrap a completed submission; rejections become the command's error
fn settle<T>(submission: Submission<T>) -> Result<T> {
    match submission {
        Submission::Completed(value) => Ok(value),
        Submission::Rejected(feedback) => Err(anyhow!(render::feedback(&feedback))),
        Submission::Ignored => bail!("Another request is still in progress"),
    }
}

async fn load_image(path: Option<PathBuf>) -> Result<Option<ImageFile>> {
    match path {
        Some(path) => Ok(Some(ImageFile::load(path).await?)),
        None => Ok(None),
    }
}

async fn open_post(client: &BoardClient, post_id: i64) -> Result<PostDetailController> {
    let detail = PostDetailController::open(client.api().clone(), client.auth().clone(), post_id).await?;
    Ok(detail)
}

async fn open_profile(client: &BoardClient) -> Result<ProfileController> {
    if !client.auth().is_authenticated() {
        bail!("Not logged in (run `boardctl login`)");
    }
    let profile = ProfileController::open(client.api().clone(), client.auth().clone()).await?;
    Ok(profile)
}

pub async fn login(client: &BoardClient, email: &str, password: &str) -> Result<()> {
    let controller = LoginController::new(client.auth().clone());
    settle(controller.submit(email, password).await)?;
    println!("Logged in as {}", email.trim());
    Ok(())
}

pub async fn register(
    client: &BoardClient,
    email: String,
    nickname: String,
    password: String,
    image: Option<PathBuf>,
) -> Result<()> {
    let registration = Registration {
        email,
        password,
        nickname,
        profile_image: load_image(image).await?,
    };
    let controller = RegisterController::new(client.auth().clone());
    settle(controller.submit(&registration).await)?;
    println!("Welcome, {}!", registration.nickname);
    Ok(())
}

pub async fn logout(client: &BoardClient) -> Result<()> {
    client.auth().logout().await;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(client: &BoardClient) -> Result<()> {
    let profile = open_profile(client).await?;
    println!("{}", render::user(&profile.user()));
    Ok(())
}

pub async fn profile(
    client: &BoardClient,
    nickname: Option<String>,
    image: Option<PathBuf>,
    remove_image: bool,
) -> Result<()> {
    let profile = open_profile(client).await?;
    let nickname = nickname.unwrap_or_else(|| profile.user().nickname);
    let change = match load_image(image).await? {
        Some(image) => ProfileImageChange::Replace(image),
        None if remove_image => ProfileImageChange::Remove,
        None => ProfileImageChange::Keep,
    };

    settle(profile.update_profile(&nickname, change).await)?;
    println!("{}", render::user(&profile.user()));
    Ok(())
}

pub async fn change_password(client: &BoardClient, new_password: &str, confirm: &str) -> Result<()> {
    let profile = open_profile(client).await?;
    settle(profile.change_password(new_password, confirm).await)?;
    println!("Password changed. Please log in again.");
    Ok(())
}

pub async fn withdraw(client: &BoardClient, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("Withdrawal deactivates your account; pass --yes to confirm");
    }
    let profile = open_profile(client).await?;
    settle(profile.withdraw().await)?;
    println!("Your account has been deactivated.");
    Ok(())
}

pub async fn feed(client: &BoardClient, pages: u32) -> Result<()> {
    let feed = FeedController::new(client.api().clone(), client.config());
    let now = Utc::now();

    for page in 0..pages.max(1) {
        match feed.load_more().await {
            FeedLoad::Loaded(posts) => {
                debug!("Page {} has {} posts", page + 1, posts.len());
                for post in &posts {
                    println!("{}", render::post_summary(post, now));
                }
            }
            FeedLoad::Exhausted | FeedLoad::Ignored => break,
            FeedLoad::Failed { attempts, error } => {
                debug!("Feed failed after {} attempts", attempts);
                return Err(error.into());
            }
        }
    }

    if feed.posts().is_empty() {
        println!("No posts yet.");
    } else if feed.has_more() {
        println!("(more posts available, use --pages)");
    }
    Ok(())
}

pub async fn show(client: &BoardClient, post_id: i64) -> Result<()> {
    let detail = open_post(client, post_id).await?;
    print!(
        "{}",
        render::post_detail(&detail.post(), &detail.comments(), Utc::now())
    );
    Ok(())
}

pub async fn like(client: &BoardClient, post_id: i64) -> Result<()> {
    let detail = open_post(client, post_id).await?;
    let state = settle(detail.toggle_like().await)?;
    let verb = if state.liked { "Liked" } else { "Unliked" };
    println!("{verb} post #{post_id} ({} likes)", render::count(state.count));
    Ok(())
}

pub async fn comment(client: &BoardClient, post_id: i64, content: &str) -> Result<()> {
    let detail = open_post(client, post_id).await?;
    let thread = settle(detail.submit_comment(content).await)?;
    println!("Comment added ({} comments)", render::count(thread.total));
    Ok(())
}

pub async fn edit_comment(client: &BoardClient, post_id: i64, comment_id: i64, content: &str) -> Result<()> {
    let detail = open_post(client, post_id).await?;
    detail
        .begin_edit(comment_id)
        .ok_or_else(|| anyhow!("Comment #{comment_id} is not one of your comments"))?;
    settle(detail.submit_comment(content).await)?;
    println!("Comment #{comment_id} updated");
    Ok(())
}

pub async fn delete_comment(client: &BoardClient, post_id: i64, comment_id: i64) -> Result<()> {
    let detail = open_post(client, post_id).await?;
    if !detail.owns_comment(comment_id) {
        bail!("Comment #{comment_id} is not one of your comments");
    }
    let thread = settle(detail.delete_comment(comment_id).await)?;
    println!("Comment deleted ({} comments)", render::count(thread.total));
    Ok(())
}

pub async fn write(client: &BoardClient, title: String, content: String, image: Option<PathBuf>) -> Result<()> {
    let editor = PostEditorController::write(client.api().clone());
    let draft = PostDraft {
        title,
        content,
        image: load_image(image).await?,
        remove_image: false,
    };
    report_saved(settle(editor.submit(&draft).await)?, "Created");
    Ok(())
}

pub async fn edit(
    client: &BoardClient,
    post_id: i64,
    title: Option<String>,
    content: Option<String>,
    image: Option<PathBuf>,
    remove_image: bool,
) -> Result<()> {
    let (editor, mut draft) = PostEditorController::edit(client.api().clone(), post_id).await?;
    if let Some(title) = title {
        draft.title = title;
    }
    if let Some(content) = content {
        draft.content = content;
    }
    draft.image = load_image(image).await?;
    draft.remove_image = remove_image;

    report_saved(settle(editor.submit(&draft).await)?, "Updated");
    Ok(())
}

pub async fn delete(client: &BoardClient, post_id: i64) -> Result<()> {
    let detail = open_post(client, post_id).await?;
    if !detail.is_owner() {
        bail!("Post #{post_id} is not one of your posts");
    }
    settle(detail.delete_post().await)?;
    println!("Deleted post #{post_id}");
    Ok(())
}

fn report_saved(navigation: Navigation, verb: &str) {
    match navigation {
        Navigation::PostDetail(post_id) => println!("{verb} post #{post_id}"),
        _ => println!("{verb} post"),
    }
}
