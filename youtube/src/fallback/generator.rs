//! Randomized synthesis of fallback records.

use crate::fallback::FallbackDataset;
use crate::models::{Channel, Comment, Video};
use jiff::{SignedDuration, Timestamp};
use rand::Rng;

const VIDEO_TITLES: &[&str] = &[
    "Writing a Tiny HTTP Server From Scratch",
    "Ten Layout Tricks Every Frontend Dev Should Know",
    "Profiling Slow Web Pages Step by Step",
    "A Gentle Introduction to WebAssembly",
    "Designing Databases That Age Well",
    "Caching Strategies for Busy APIs",
    "Building Forms Users Actually Like",
    "Understanding Event Loops in Depth",
    "From Monolith to Services Without Tears",
    "Testing UI Components the Practical Way",
    "Shipping Dark Mode Done Right",
];

const CHANNEL_NAMES: &[&str] = &[
    "Byte Sized Lessons",
    "Pixel Workshop",
    "Stack Notes",
    "The Debug Diaries",
    "Frontend Field Guide",
    "Server Side Stories",
    "Open Source Hour",
    "Code and Coffee",
    "Layout Lab",
    "Async Academy",
];

const DESCRIPTIONS: &[&str] = &[
    "A hands-on walkthrough with working code you can follow along with.",
    "We cover the fundamentals first and then build something real.",
    "Practical tips collected from years of shipping production software.",
    "Everything you need to get started, explained without jargon.",
    "A deep dive into how this works under the hood.",
    "Common mistakes, how to spot them and how to fix them.",
    "Live coding session with commentary and Q&A.",
    "Short and focused: one concept, explained well.",
    "Beginner friendly, with bonus material for experienced developers.",
    "Real-world examples taken from open source projects.",
];

const COMMENT_AUTHORS: &[&str] = &[
    "Curious Coder",
    "Night Owl Dev",
    "Tab Hoarder",
    "Refactor Fan",
    "Weekend Hacker",
    "Pixel Pusher",
];

const EXTENDED_DESCRIPTION: &str = "\n\nIn this video we go well beyond the basics.\n\n\
Chapters:\n\
- Why this matters\n\
- Setting up the project\n\
- The core technique, step by step\n\
- Pitfalls and how to avoid them\n\
- Wrapping up with a real example\n\n\
Whether you are just starting out or have been doing this for years, there is something here \
for you.";

pub(crate) const TRENDING_COUNT: usize = 12;
pub(crate) const SEARCH_FROM_TRENDING: usize = 5;
pub(crate) const EXTRA_SEARCH_COUNT: usize = 10;
pub(crate) const COMMENT_COUNT: usize = 8;
pub(crate) const CHANNEL_VIDEO_COUNT: usize = 8;

/// Generates [`FallbackDataset`]s from a caller-supplied random source.
///
/// Given the same seeded generator and the same `now`, the output is identical.
#[derive(Debug)]
pub struct FallbackGenerator<R> {
    rng: R,
}

impl<R: Rng> FallbackGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform integer in `[min, max]`.
    fn random_int(&mut self, min: u64, max: u64) -> u64 {
        self.rng.gen_range(min..=max)
    }

    fn pick<'a>(&mut self, pool: &[&'a str]) -> &'a str {
        let i = self.random_int(0, pool.len() as u64 - 1);
        pool[i as usize]
    }

    fn random_published_at(&mut self, now: Timestamp) -> Timestamp {
        let days_ago = self.random_int(1, 30) as i64;
        now - SignedDuration::from_hours(24 * days_ago)
    }

    fn random_channel_id(&mut self) -> String {
        format!("mock-channel-{}", self.random_int(1, 20))
    }

    fn videos(&mut self, batch: &str, count: usize, now: Timestamp) -> Vec<Video> {
        (0..count)
            .map(|i| {
                let title = self.pick(VIDEO_TITLES);
                let channel_title = self.pick(CHANNEL_NAMES);
                Video {
                    id: format!("mock-{batch}-{}-{i}", now.as_millisecond()),
                    title: title.to_string(),
                    channel_title: channel_title.to_string(),
                    channel_id: self.random_channel_id(),
                    published_at: self.random_published_at(now),
                    thumbnail_url: placeholder_thumbnail(title),
                    view_count: self.random_int(10_000, 5_000_000).to_string(),
                    description: self.pick(DESCRIPTIONS).to_string(),
                }
            })
            .collect()
    }

    fn comments(&mut self, count: usize, now: Timestamp) -> Vec<Comment> {
        (0..count)
            .map(|i| {
                let author = self.pick(COMMENT_AUTHORS);
                Comment {
                    id: format!("mock-comment-{}-{i}", now.as_millisecond()),
                    author_name: author.to_string(),
                    author_profile_image_url: placeholder_avatar(author, 48),
                    text: self.pick(DESCRIPTIONS).to_string(),
                    like_count: self.random_int(1, 500).to_string(),
                    published_at: self.random_published_at(now),
                }
            })
            .collect()
    }

    fn channel(&mut self) -> Channel {
        let title = self.pick(CHANNEL_NAMES);
        Channel {
            id: self.random_channel_id(),
            title: title.to_string(),
            description: format!(
                "{title} publishes practical programming tutorials every week. \
                 Subscribe for project-based lessons on building for the web."
            ),
            thumbnail_url: placeholder_avatar(title, 100),
            subscriber_count: self.random_int(10_000, 5_000_000).to_string(),
            video_count: self.random_int(50, 500).to_string(),
        }
    }

    /// Produces a complete dataset with timestamps relative to `now`.
    pub fn generate(&mut self, now: Timestamp) -> FallbackDataset {
        let trending_videos = self.videos("video", TRENDING_COUNT, now);

        let mut search_results: Vec<Video> = trending_videos
            .iter()
            .take(SEARCH_FROM_TRENDING)
            .cloned()
            .collect();
        search_results.extend(self.videos("search", EXTRA_SEARCH_COUNT, now));

        let featured = self.random_int(0, trending_videos.len() as u64 - 1) as usize;
        let mut video_details = trending_videos[featured].clone();
        video_details.description.push_str(EXTENDED_DESCRIPTION);

        let channel_details = self.channel();
        let comments = self.comments(COMMENT_COUNT, now);
        let channel_videos = self.videos("channel-video", CHANNEL_VIDEO_COUNT, now);

        FallbackDataset {
            trending_videos,
            search_results,
            video_details,
            channel_details,
            comments,
            channel_videos,
        }
    }
}

/// Placeholder image URL labelled with (the start of) a video title.
pub(crate) fn placeholder_thumbnail(title: &str) -> String {
    let label: String = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("+")
        .chars()
        .take(20)
        .collect();
    format!("/placeholder.svg?height=180&width=320&text={label}")
}

/// Square placeholder image labelled with the initials of `name`.
pub(crate) fn placeholder_avatar(name: &str, size: u32) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect();
    format!("/placeholder.svg?height={size}&width={size}&text={initials}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const DAY: SignedDuration = SignedDuration::from_secs(24 * 60 * 60);

    fn now() -> Timestamp {
        "2025-05-20T08:30:00Z".parse().unwrap()
    }

    #[test]
    fn same_seed_same_dataset() {
        let a = FallbackGenerator::new(StdRng::seed_from_u64(7)).generate(now());
        let b = FallbackGenerator::new(StdRng::seed_from_u64(7)).generate(now());
        assert_eq!(a, b);
    }

    #[test]
    fn dataset_shape() {
        for seed in 0..20 {
            let dataset = FallbackGenerator::new(StdRng::seed_from_u64(seed)).generate(now());

            assert_eq!(dataset.trending_videos.len(), TRENDING_COUNT);
            assert_eq!(
                dataset.search_results.len(),
                SEARCH_FROM_TRENDING + EXTRA_SEARCH_COUNT
            );
            assert_eq!(
                dataset.search_results[..SEARCH_FROM_TRENDING],
                dataset.trending_videos[..SEARCH_FROM_TRENDING]
            );
            assert_eq!(dataset.comments.len(), COMMENT_COUNT);
            assert_eq!(dataset.channel_videos.len(), CHANNEL_VIDEO_COUNT);

            let featured = dataset
                .trending_videos
                .iter()
                .find(|v| v.id == dataset.video_details.id)
                .expect("video details extend a trending video");
            assert!(dataset.video_details.description.starts_with(&featured.description));
            assert!(dataset.video_details.description.len() > featured.description.len());

            let channel = &dataset.channel_details;
            let subscribers: u64 = channel.subscriber_count.parse().unwrap();
            assert!((10_000..=5_000_000).contains(&subscribers));
            let videos: u64 = channel.video_count.parse().unwrap();
            assert!((50..=500).contains(&videos));
        }
    }

    #[test]
    fn video_fields_in_range() {
        let dataset = FallbackGenerator::new(StdRng::seed_from_u64(42)).generate(now());
        let all = dataset
            .trending_videos
            .iter()
            .chain(&dataset.search_results)
            .chain(&dataset.channel_videos)
            .chain(std::iter::once(&dataset.video_details));
        for video in all {
            let views: u64 = video.view_count.parse().expect("numeric view count");
            assert!((10_000..=5_000_000).contains(&views), "{views}");

            assert!(video.published_at <= now() - DAY);
            assert!(video.published_at >= now() - SignedDuration::from_hours(24 * 30));

            assert!(VIDEO_TITLES.contains(&video.title.as_str()));
            assert!(CHANNEL_NAMES.contains(&video.channel_title.as_str()));
            assert_eq!(video.thumbnail_url, placeholder_thumbnail(&video.title));

            let channel_number: u64 = video
                .channel_id
                .strip_prefix("mock-channel-")
                .unwrap()
                .parse()
                .unwrap();
            assert!((1..=20).contains(&channel_number));
        }

        for comment in &dataset.comments {
            let likes: u64 = comment.like_count.parse().unwrap();
            assert!((1..=500).contains(&likes));
        }
    }

    #[test]
    fn ids_are_unique() {
        let dataset = FallbackGenerator::new(StdRng::seed_from_u64(3)).generate(now());
        let mut ids: Vec<&str> = dataset
            .trending_videos
            .iter()
            .chain(&dataset.search_results[SEARCH_FROM_TRENDING..])
            .chain(&dataset.channel_videos)
            .map(|v| v.id.as_str())
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn random_int_is_inclusive() {
        let mut generator = FallbackGenerator::new(StdRng::seed_from_u64(1));
        assert_eq!(generator.random_int(5, 5), 5);

        let mut seen = [false; 3];
        for _ in 0..200 {
            let n = generator.random_int(0, 2);
            seen[n as usize] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn placeholders() {
        assert_eq!(
            placeholder_thumbnail("Caching Strategies for Busy APIs"),
            "/placeholder.svg?height=180&width=320&text=Caching+Strategies+f"
        );
        assert_eq!(
            placeholder_avatar("Night Owl Dev", 48),
            "/placeholder.svg?height=48&width=48&text=NOD"
        );
    }
}
