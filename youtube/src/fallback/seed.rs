//! Hand-written sample records served before any dataset has been generated.

use crate::fallback::FallbackDataset;
use crate::fallback::generator::{placeholder_avatar, placeholder_thumbnail};
use crate::models::{Channel, Comment, Video};
use jiff::{SignedDuration, Timestamp};

struct SeedVideo {
    id: &'static str,
    title: &'static str,
    channel_title: &'static str,
    channel_id: &'static str,
    days_ago: i64,
    view_count: &'static str,
    description: &'static str,
}

const TRENDING: &[SeedVideo] = &[
    SeedVideo {
        id: "seed-video-1",
        title: "Build a Video Site in a Weekend",
        channel_title: "Weekend Builds",
        channel_id: "seed-channel-1",
        days_ago: 2,
        view_count: "1254789",
        description: "We build a small video browsing site from an empty folder to a deployed app.",
    },
    SeedVideo {
        id: "seed-video-2",
        title: "Responsive Layouts Without Media Query Soup",
        channel_title: "Layout Lab",
        channel_id: "seed-channel-2",
        days_ago: 3,
        view_count: "987654",
        description: "Fluid grids, container queries and a handful of rules that scale to any screen.",
    },
    SeedVideo {
        id: "seed-video-3",
        title: "Why Your Page Is Slow and How to Prove It",
        channel_title: "Stack Notes",
        channel_id: "seed-channel-3",
        days_ago: 1,
        view_count: "567890",
        description: "Reading performance traces and fixing the three most common bottlenecks.",
    },
    SeedVideo {
        id: "seed-video-4",
        title: "Working With the YouTube Data API",
        channel_title: "Weekend Builds",
        channel_id: "seed-channel-1",
        days_ago: 5,
        view_count: "345678",
        description: "API keys, quota costs and how to keep an app usable when the quota runs out.",
    },
    SeedVideo {
        id: "seed-video-5",
        title: "Type-Safe Forms From Schema to Submit",
        channel_title: "Frontend Field Guide",
        channel_id: "seed-channel-4",
        days_ago: 4,
        view_count: "789012",
        description: "One schema drives validation, error messages and the request payload.",
    },
    SeedVideo {
        id: "seed-video-6",
        title: "Caching Strategies for Busy APIs",
        channel_title: "Server Side Stories",
        channel_id: "seed-channel-5",
        days_ago: 6,
        view_count: "234567",
        description: "Time-based expiry, stale-while-revalidate and when not to cache at all.",
    },
];

const EXTRA_SEARCH: &[SeedVideo] = &[
    SeedVideo {
        id: "seed-search-1",
        title: "Search Tips Every Developer Should Know",
        channel_title: "Byte Sized Lessons",
        channel_id: "seed-channel-6",
        days_ago: 7,
        view_count: "123456",
        description: "Find answers faster with better queries, filters and documentation habits.",
    },
    SeedVideo {
        id: "seed-search-2",
        title: "Accessible Components From Day One",
        channel_title: "Pixel Workshop",
        channel_id: "seed-channel-7",
        days_ago: 8,
        view_count: "234567",
        description: "Keyboard support, focus management and labels that screen readers understand.",
    },
];

const CHANNEL_VIDEOS: &[SeedVideo] = &[
    SeedVideo {
        id: "seed-channel-video-1",
        title: "Build a Video Site in a Weekend",
        channel_title: "Weekend Builds",
        channel_id: "seed-channel-1",
        days_ago: 2,
        view_count: "1254789",
        description: "We build a small video browsing site from an empty folder to a deployed app.",
    },
    SeedVideo {
        id: "seed-channel-video-2",
        title: "Build a Chat App in a Weekend",
        channel_title: "Weekend Builds",
        channel_id: "seed-channel-1",
        days_ago: 16,
        view_count: "412093",
        description: "Realtime messaging with presence indicators and message history.",
    },
    SeedVideo {
        id: "seed-channel-video-3",
        title: "Build a Photo Gallery in a Weekend",
        channel_title: "Weekend Builds",
        channel_id: "seed-channel-1",
        days_ago: 27,
        view_count: "298110",
        description: "Uploads, thumbnails and an infinite-scroll grid that stays fast.",
    },
];

const COMMENTS: &[(&str, &str, &str, i64)] = &[
    (
        "Curious Coder",
        "The part about quota costs saved me from burning through my key on day one.",
        "342",
        2,
    ),
    (
        "Night Owl Dev",
        "Could you do a follow-up on adding sign-in to this project?",
        "156",
        3,
    ),
    (
        "Tab Hoarder",
        "Clean explanation. I like how every step builds on the last one.",
        "98",
        4,
    ),
    (
        "Weekend Hacker",
        "Followed along and had it running by lunch. Thanks!",
        "45",
        6,
    ),
];

fn days_before(now: Timestamp, days: i64) -> Timestamp {
    now - SignedDuration::from_hours(24 * days)
}

fn video(seed: &SeedVideo, now: Timestamp) -> Video {
    Video {
        id: seed.id.to_string(),
        title: seed.title.to_string(),
        channel_title: seed.channel_title.to_string(),
        channel_id: seed.channel_id.to_string(),
        published_at: days_before(now, seed.days_ago),
        thumbnail_url: placeholder_thumbnail(seed.title),
        view_count: seed.view_count.to_string(),
        description: seed.description.to_string(),
    }
}

/// The static seed dataset, with publish dates relative to `now`.
pub fn seed_dataset(now: Timestamp) -> FallbackDataset {
    let trending_videos: Vec<Video> = TRENDING.iter().map(|s| video(s, now)).collect();
    let search_results = trending_videos
        .iter()
        .cloned()
        .chain(EXTRA_SEARCH.iter().map(|s| video(s, now)))
        .collect();

    let mut video_details = video(&TRENDING[3], now);
    video_details.id = "seed-video-details".to_string();
    video_details.description = "API keys, quota costs and how to keep an app usable when the \
        quota runs out.\n\nWhat we cover:\n\
        - Creating a project and an API key\n\
        - Listing trending videos and searching\n\
        - Why a search costs a hundred times more than a lookup\n\
        - Detecting quota errors\n\
        - Serving sample data until the quota resets\n\n\
        Aimed at developers who already know the basics of HTTP and JSON."
        .to_string();

    let channel_details = Channel {
        id: "seed-channel-1".to_string(),
        title: "Weekend Builds".to_string(),
        description: "Complete projects, start to finish, in a weekend or less. New builds \
            every other Saturday."
            .to_string(),
        thumbnail_url: placeholder_avatar("Weekend Builds", 100),
        subscriber_count: "1234567".to_string(),
        video_count: "156".to_string(),
    };

    let comments = COMMENTS
        .iter()
        .enumerate()
        .map(|(i, &(author, text, likes, days_ago))| Comment {
            id: format!("seed-comment-{}", i + 1),
            author_name: author.to_string(),
            author_profile_image_url: placeholder_avatar(author, 48),
            text: text.to_string(),
            like_count: likes.to_string(),
            published_at: days_before(now, days_ago),
        })
        .collect();

    let channel_videos = CHANNEL_VIDEOS.iter().map(|s| video(s, now)).collect();

    FallbackDataset {
        trending_videos,
        search_results,
        video_details,
        channel_details,
        comments,
        channel_videos,
    }
}
