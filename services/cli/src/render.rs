//! Plain-text rendering of board data

use std::fmt::Write;

use board_client::comments::ThreadState;
use board_client::controllers::{Feedback, Field};
use board_client::display::{compact_count, relative_time};
use board_client::models::{Post, User};
use chrono::{DateTime, Utc};

pub fn count(n: u64) -> String {
    compact_count(n)
}

fn field_label(field: Field) -> &'static str {
    match field {
        Field::Email => "email",
        Field::Password => "password",
        Field::Nickname => "nickname",
        Field::CurrentPassword => "current password",
        Field::NewPassword => "new password",
        Field::Title => "title",
        Field::Content => "content",
        Field::Comment => "comment",
        Field::Image => "image",
    }
}

pub fn feedback(feedback: &Feedback) -> String {
    match feedback {
        Feedback::Notice(message) => message.clone(),
        Feedback::Field { field, message } => format!("{}: {}", field_label(*field), message),
        Feedback::LoginRequired => "Please log in first (run `boardctl login`)".to_string(),
        Feedback::SessionEnded(message) => format!("{message} Please log in again."),
    }
}

fn when(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    at.map(|at| relative_time(at, now)).unwrap_or_default()
}

/// One feed line
pub fn post_summary(post: &Post, now: DateTime<Utc>) -> String {
    format!(
        "#{:<5} {}  [{}]  likes {} · comments {} · views {}  {}",
        post.post_id,
        post.title,
        post.author.display_name(),
        compact_count(post.stats.like_count),
        compact_count(post.stats.comment_count),
        compact_count(post.stats.view_count),
        when(post.created_at, now),
    )
}

pub fn post_detail(post: &Post, thread: &ThreadState, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", post.post_id, post.title);
    let _ = writeln!(
        out,
        "by {}  {}",
        post.author.display_name(),
        when(post.created_at, now)
    );
    if let Some(image) = post.primary_image() {
        let _ = writeln!(out, "image: {image}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", post.content);
    let _ = writeln!(out);
    let liked = if post.is_liked_by_current_user { " (you like this)" } else { "" };
    let _ = writeln!(
        out,
        "likes {}{} · views {}",
        compact_count(post.stats.like_count),
        liked,
        compact_count(post.stats.view_count)
    );

    let _ = writeln!(out, "--- {} comments", compact_count(thread.total));
    for comment in &thread.comments {
        let _ = writeln!(
            out,
            "[{}] {}  {}: {}",
            comment.comment_id,
            when(comment.created_at, now),
            comment.author.display_name(),
            comment.content
        );
    }
    out
}

pub fn user(user: &User) -> String {
    let mut line = format!("{} <{}> (#{})", user.nickname, user.email, user.user_id);
    if let Some(image) = &user.profile_image {
        line.push_str(&format!("\nprofile image: {image}"));
    }
    line
}
