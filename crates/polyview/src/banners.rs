//! Error and info banners shown over the viewport.

use std::collections::VecDeque;

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Error,
}

pub type BannerId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: BannerId,
    pub kind: BannerKind,
    pub text: String,
}

/// Banner queue. Identical banners are shown once.
#[derive(Debug)]
pub struct Banners {
    queue: VecDeque<Banner>,
    next_id: BannerId,
}

impl Default for Banners {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            next_id: 1,
        }
    }
}

impl Banners {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: BannerKind, text: String) -> BannerId {
        if let Some(existing) = self.queue.iter().find(|b| b.kind == kind && b.text == text) {
            return existing.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.queue.push_back(Banner { id, kind, text });
        id
    }

    pub fn show_error(&mut self, text: impl Into<String>) -> BannerId {
        let text = text.into();
        error!("banner: {text}");
        self.push(BannerKind::Error, text)
    }

    pub fn show_info(&mut self, text: impl Into<String>) -> BannerId {
        let text = text.into();
        info!("banner: {text}");
        self.push(BannerKind::Info, text)
    }

    /// User dismissed a banner.
    pub fn dismiss(&mut self, id: BannerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|b| b.id != id);
        before != self.queue.len()
    }

    pub fn clear_errors(&mut self) {
        self.queue.retain(|b| b.kind != BannerKind::Error);
    }

    pub fn clear_info(&mut self) {
        self.queue.retain(|b| b.kind != BannerKind::Info);
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Banner> {
        self.queue.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Banner> {
        self.queue.iter().filter(|b| b.kind == BannerKind::Error)
    }

    pub fn infos(&self) -> impl Iterator<Item = &Banner> {
        self.queue.iter().filter(|b| b.kind == BannerKind::Info)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
