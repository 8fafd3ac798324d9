use crate::domain::{ImageQuality, PhotoTier};

pub const OPEN_DATA_BASE: &str = "https://inaturalist-open-data.s3.amazonaws.com/photos";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectUrls {
    pub original: Option<String>,
    pub large: Option<String>,
    pub medium: Option<String>,
    pub small: Option<String>,
    pub url: Option<String>,
}

impl DirectUrls {
    fn tier(&self, tier: PhotoTier) -> Option<&str> {
        match tier {
            PhotoTier::Original => self.original.as_deref(),
            PhotoTier::Large => self.large.as_deref(),
            PhotoTier::Medium => self.medium.as_deref(),
            PhotoTier::Small => self.small.as_deref(),
            PhotoTier::Square => None,
        }
    }
}

pub fn direct_chain(quality: ImageQuality) -> &'static [PhotoTier] {
    match quality {
        ImageQuality::Original | ImageQuality::Best => &[PhotoTier::Original, PhotoTier::Large],
        ImageQuality::Large => &[PhotoTier::Large, PhotoTier::Original],
        ImageQuality::Medium => &[PhotoTier::Medium, PhotoTier::Large, PhotoTier::Original],
        ImageQuality::Small => &[
            PhotoTier::Small,
            PhotoTier::Medium,
            PhotoTier::Large,
            PhotoTier::Original,
        ],
    }
}

pub fn template_chain(quality: ImageQuality) -> &'static [PhotoTier] {
    match quality {
        ImageQuality::Original | ImageQuality::Best => {
            &[PhotoTier::Original, PhotoTier::Large, PhotoTier::Square]
        }
        ImageQuality::Large => &[PhotoTier::Large, PhotoTier::Original, PhotoTier::Square],
        ImageQuality::Medium => &[
            PhotoTier::Medium,
            PhotoTier::Large,
            PhotoTier::Original,
            PhotoTier::Square,
        ],
        ImageQuality::Small => &[
            PhotoTier::Small,
            PhotoTier::Medium,
            PhotoTier::Large,
            PhotoTier::Original,
            PhotoTier::Square,
        ],
    }
}

pub fn template_url(photo_id: u64, tier: PhotoTier) -> String {
    format!("{OPEN_DATA_BASE}/{photo_id}/{}.jpg", tier.as_str())
}

pub fn candidates(
    photo_id: Option<u64>,
    quality: ImageQuality,
    direct: Option<&DirectUrls>,
) -> Vec<String> {
    if let Some(direct) = direct {
        let mut urls: Vec<String> = Vec::new();
        let chain = direct_chain(quality)
            .iter()
            .filter_map(|tier| direct.tier(*tier))
            .chain(direct.url.as_deref());
        for url in chain {
            if !url.is_empty() && !urls.iter().any(|seen| seen == url) {
                urls.push(url.to_string());
            }
        }
        if !urls.is_empty() {
            return urls;
        }
    }

    match photo_id {
        Some(id) => template_chain(quality)
            .iter()
            .map(|tier| template_url(id, *tier))
            .collect(),
        None => Vec::new(),
    }
}
