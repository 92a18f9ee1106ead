//! Guest photo gallery: submissions, moderation views and paging.

use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{NewPhoto, Photo, PhotoSubmission, WeddingInfo, PHOTO_CATEGORIES};

pub const PHOTOS_PER_PAGE: i64 = 12;
pub const HOME_FEATURED: i64 = 4;
pub const HOME_RECENT: i64 = 8;
pub const DEFAULT_UPLOAD_CATEGORY: &str = "party";
pub const DEFAULT_TITLE: &str = "Wedding photo";
pub const ANONYMOUS_UPLOADER: &str = "Anonymous guest";

const MAX_UPLOADER_NAME: usize = 100;
const MAX_TITLE: usize = 200;

fn camera_prefix() -> &'static Regex {
    static CAMERA_PREFIX: OnceLock<Regex> = OnceLock::new();
    CAMERA_PREFIX.get_or_init(|| {
        Regex::new(r"(?i)^(IMG|DSC|PHOTO|PIC)([\s_-]+\d*|\d+)[\s_-]*").expect("camera prefix pattern is valid")
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Turns an uploaded file name into a readable title.
///
/// `IMG_1234.jpg` and `20240612.png` carry no information and get the default
/// title; `first_dance-party.JPG` becomes `First Dance Party`.
pub fn title_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let spaced = stem.replace(['_', '-'], " ");
    let stripped = camera_prefix().replace(&spaced, "");
    let trimmed = stripped.trim();

    if trimmed.is_empty() || trimmed.chars().all(|c| c.is_ascii_digit()) {
        return DEFAULT_TITLE.to_string();
    }

    let title = trimmed.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ");
    title.chars().take(MAX_TITLE).collect()
}

pub fn is_known_category(category: &str) -> bool {
    PHOTO_CATEGORIES.contains(&category)
}

/// Validates a guest submission and turns it into unapproved photo rows.
pub fn prepare_submission(submission: &PhotoSubmission) -> Result<Vec<NewPhoto>, ApiError> {
    if submission.photos.is_empty() {
        return Err(ApiError::ValidationMissing("at least one photo is required".to_string()));
    }

    let category = match submission.category.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_UPLOAD_CATEGORY.to_string(),
        Some(c) if is_known_category(c) => c.to_string(),
        Some(c) => return Err(ApiError::MalformedInput(format!("unknown photo category '{}'", c))),
    };

    let uploader_name = submission.uploader_name.trim();
    if uploader_name.chars().count() > MAX_UPLOADER_NAME {
        return Err(ApiError::MalformedInput(format!(
            "uploader_name must be at most {} characters",
            MAX_UPLOADER_NAME
        )));
    }

    submission
        .photos
        .iter()
        .map(|file| {
            let image_url = file.image_url.trim();
            if image_url.is_empty() {
                return Err(ApiError::ValidationMissing(format!("image_url is required for '{}'", file.filename)));
            }
            Ok(NewPhoto {
                title: title_from_filename(&file.filename),
                description: submission.description.trim().to_string(),
                image_url: image_url.to_string(),
                category: category.clone(),
                uploader_name: uploader_name.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub offset: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// Resolves a requested page leniently: garbage means the first page, anything
/// out of range means the last one. There is always at least one page.
pub fn page_window(requested: Option<&str>, total: i64, per_page: i64) -> PageWindow {
    let num_pages = ((total.max(0) + per_page - 1) / per_page).max(1);
    let number = match requested.map(str::trim).map(str::parse::<i64>) {
        None | Some(Err(_)) => 1,
        Some(Ok(n)) if n < 1 || n > num_pages => num_pages,
        Some(Ok(n)) => n,
    };

    PageWindow { number, num_pages, offset: (number - 1) * per_page, limit: per_page }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhotoView {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    pub uploaded_by: String,
    pub approved: bool,
    pub featured: bool,
    pub upload_date: NaiveDateTime,
}

impl From<Photo> for PhotoView {
    fn from(p: Photo) -> Self {
        let uploaded_by = if p.uploader_name.trim().is_empty() {
            ANONYMOUS_UPLOADER.to_string()
        } else {
            p.uploader_name.trim().to_string()
        };
        PhotoView {
            id: p.id,
            title: p.title,
            description: p.description,
            image_url: p.image_url,
            category: p.category,
            uploaded_by,
            approved: p.approved,
            featured: p.featured,
            upload_date: p.upload_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhotoPage {
    pub photos: Vec<PhotoView>,
    pub has_next: bool,
    pub has_previous: bool,
    pub num_pages: i64,
    pub current_page: i64,
    pub total_count: i64,
}

impl PhotoPage {
    pub fn new(photos: Vec<Photo>, window: PageWindow, total_count: i64) -> Self {
        PhotoPage {
            photos: photos.into_iter().map(PhotoView::from).collect(),
            has_next: window.has_next(),
            has_previous: window.has_previous(),
            num_pages: window.num_pages,
            current_page: window.number,
            total_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub wedding_info: Option<WeddingInfo>,
    pub featured_photos: Vec<PhotoView>,
    pub recent_photos: Vec<PhotoView>,
}
