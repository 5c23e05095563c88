//! Demo records shown when the backend cannot be reached.
//!
//! Content is fixed; only timestamps that must read as recent are derived
//! from the caller's `now`.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::location::{CoordinateSource, Coordinates, LocationType};
use crate::models::{
    Achievement, Author, Challenge, ChallengePeriod, CleanupHistoryEntry, CleanupLocation,
    CommentView, FeedPost, LeaderboardEntry, PostPreview, ProfileView, Reward,
};

fn avatar(color: &str, fg: &str, size: u32, initial: char) -> String {
    format!("https://via.placeholder.com/{size}x{size}/{color}/{fg}?text={initial}")
}

fn author(name: &str, size: u32) -> Author {
    let initial = name.chars().next().unwrap_or('U');
    Author {
        name: name.to_string(),
        avatar_url: avatar("ffd300", "000", size, initial),
    }
}

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| (*t).to_string()).collect()
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Feed posts, newest first.
#[must_use]
pub fn feed_posts(now: DateTime<Utc>) -> Vec<FeedPost> {
    vec![
        FeedPost {
            id: "1".to_string(),
            user_id: "demo1".to_string(),
            author: author("Sarah M.", 50),
            image_url: "https://via.placeholder.com/400x300/4CAF50/fff?text=AFTER+CLEANUP"
                .to_string(),
            caption: "Cleaned up Mount Lavinia Beach! The transformation is incredible. 🌊✨"
                .to_string(),
            location: "Mount Lavinia Beach, Colombo".to_string(),
            hashtags: tags(&["#TrashTagLKA", "#CleanSriLanka", "#BeachCleanup"]),
            likes_count: 24,
            comments_count: 8,
            is_before_photo: false,
            created_at: now,
            user_has_liked: false,
        },
        FeedPost {
            id: "2".to_string(),
            user_id: "demo2".to_string(),
            author: author("Raj K.", 50),
            image_url: "https://via.placeholder.com/400x300/FF9800/fff?text=BEFORE+CLEANUP"
                .to_string(),
            caption: "Found this mess at Viharamahadevi Park. Time to make a difference! 🗑️"
                .to_string(),
            location: "Viharamahadevi Park, Colombo".to_string(),
            hashtags: tags(&["#TrashTagLKA", "#ParkCleanup", "#MakeADifference"]),
            likes_count: 18,
            comments_count: 5,
            is_before_photo: true,
            created_at: now - Duration::days(1),
            user_has_liked: true,
        },
        FeedPost {
            id: "3".to_string(),
            user_id: "demo3".to_string(),
            author: author("Lakshmi P.", 50),
            image_url: "https://via.placeholder.com/400x300/4CAF50/fff?text=AFTER+CLEANUP"
                .to_string(),
            caption: "Galle Face Green is now spotless! Small actions, big impact. 🌱".to_string(),
            location: "Galle Face Green, Colombo".to_string(),
            hashtags: tags(&["#TrashTagLKA", "#StreetCleanup", "#BigImpact"]),
            likes_count: 31,
            comments_count: 12,
            is_before_photo: false,
            created_at: now - Duration::days(2),
            user_has_liked: false,
        },
    ]
}

/// Header for the comments screen of `post_id`.
///
/// Known demo ids reuse their feed post; anything else gets a generic card.
#[must_use]
pub fn post_preview(post_id: &str, now: DateTime<Utc>) -> PostPreview {
    feed_posts(now)
        .into_iter()
        .find(|p| p.id == post_id)
        .map_or_else(
            || PostPreview {
                id: post_id.to_string(),
                image_url: "https://via.placeholder.com/400x300/4CAF50/fff?text=CLEANUP"
                    .to_string(),
                caption: "Community cleanup".to_string(),
                location: "Colombo".to_string(),
                comments_count: 2,
            },
            |p| PostPreview {
                id: p.id,
                image_url: p.image_url,
                caption: p.caption,
                location: p.location,
                comments_count: p.comments_count,
            },
        )
}

/// Comments for any post, oldest first.
#[must_use]
pub fn comments(post_id: &str, now: DateTime<Utc>) -> Vec<CommentView> {
    vec![
        CommentView {
            id: format!("{post_id}-c1"),
            post_id: post_id.to_string(),
            user_id: "demo2".to_string(),
            author: author("Raj K.", 40),
            content: "Amazing work! Count me in for the next one.".to_string(),
            created_at: now - Duration::hours(3),
        },
        CommentView {
            id: format!("{post_id}-c2"),
            post_id: post_id.to_string(),
            user_id: "demo3".to_string(),
            author: author("Lakshmi P.", 40),
            content: "What a difference. Thank you for doing this! 💚".to_string(),
            created_at: now - Duration::minutes(25),
        },
    ]
}

/// Map pins.
#[must_use]
pub fn locations() -> Vec<CleanupLocation> {
    let after = vec!["https://via.placeholder.com/200x150/4CAF50/fff?text=AFTER".to_string()];
    vec![
        CleanupLocation {
            id: "1".to_string(),
            name: "Mount Lavinia Beach".to_string(),
            kind: LocationType::Beach,
            coordinates: Coordinates {
                latitude: 6.8397,
                longitude: 79.8636,
            },
            coordinate_source: CoordinateSource::Demo,
            description: "Beautiful beach cleanup completed".to_string(),
            photos: after.clone(),
            created_at: date(2024, 1, 15),
            contributor: "Sarah M.".to_string(),
        },
        CleanupLocation {
            id: "2".to_string(),
            name: "Viharamahadevi Park".to_string(),
            kind: LocationType::Park,
            coordinates: Coordinates {
                latitude: 6.9271,
                longitude: 79.8612,
            },
            coordinate_source: CoordinateSource::Demo,
            description: "Central park cleanup".to_string(),
            photos: after.clone(),
            created_at: date(2024, 1, 14),
            contributor: "Raj K.".to_string(),
        },
        CleanupLocation {
            id: "3".to_string(),
            name: "Galle Face Green".to_string(),
            kind: LocationType::Street,
            coordinates: Coordinates {
                latitude: 6.9271,
                longitude: 79.8412,
            },
            coordinate_source: CoordinateSource::Demo,
            description: "Street cleanup along the promenade".to_string(),
            photos: after,
            created_at: date(2024, 1, 13),
            contributor: "Lakshmi P.".to_string(),
        },
    ]
}

#[must_use]
pub fn challenges() -> Vec<Challenge> {
    let challenge = |id: &str,
                     title: &str,
                     description: &str,
                     icon: &str,
                     (progress, target): (u32, u32),
                     reward: &str,
                     reward_icon: &str,
                     deadline: &str,
                     period: ChallengePeriod| Challenge {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        progress,
        target,
        reward: reward.to_string(),
        reward_icon: reward_icon.to_string(),
        deadline: deadline.to_string(),
        period,
    };

    vec![
        challenge(
            "1",
            "Beach Guardian",
            "Clean up 3 beach areas this week",
            "water",
            (2, 3),
            "50 Points + Beach Badge",
            "star",
            "3 days left",
            ChallengePeriod::Weekly,
        ),
        challenge(
            "2",
            "Social Butterfly",
            "Get 25 likes on your posts",
            "heart",
            (18, 25),
            "30 Points",
            "heart",
            "5 days left",
            ChallengePeriod::Weekly,
        ),
        challenge(
            "3",
            "Consistent Cleaner",
            "Complete 5 cleanups this week",
            "checkmark-circle",
            (3, 5),
            "75 Points + Consistency Badge",
            "trophy",
            "4 days left",
            ChallengePeriod::Weekly,
        ),
        challenge(
            "4",
            "Early Bird",
            "Complete a cleanup before 9 AM",
            "sunny",
            (0, 1),
            "20 Points",
            "sunny",
            "Today",
            ChallengePeriod::Daily,
        ),
    ]
}

#[must_use]
pub fn leaderboard() -> Vec<LeaderboardEntry> {
    [
        (1, "Sarah M.", "ffd300", "000", 1240, 12),
        (2, "Raj K.", "4CAF50", "fff", 1180, 11),
        (3, "Lakshmi P.", "FF9800", "fff", 1050, 9),
        (4, "Alex T.", "9C27B0", "fff", 920, 8),
        (5, "Maya S.", "607D8B", "fff", 850, 7),
    ]
    .into_iter()
    .map(|(rank, name, bg, fg, points, cleanups)| LeaderboardEntry {
        rank,
        name: name.to_string(),
        avatar_url: avatar(bg, fg, 40, name.chars().next().unwrap_or('U')),
        points,
        cleanups,
    })
    .collect()
}

#[must_use]
pub fn rewards() -> Vec<Reward> {
    [
        ("1", "Beach Guardian", "water", true, 50),
        ("2", "Consistency Badge", "checkmark-circle", true, 75),
        ("3", "Social Butterfly", "heart", false, 100),
        ("4", "Eco Warrior", "leaf", false, 200),
        ("5", "Master Cleaner", "trophy", false, 500),
    ]
    .into_iter()
    .map(|(id, title, icon, unlocked, points)| Reward {
        id: id.to_string(),
        title: title.to_string(),
        icon: icon.to_string(),
        unlocked,
        points,
    })
    .collect()
}

#[must_use]
pub fn profile() -> ProfileView {
    ProfileView {
        id: "demo1".to_string(),
        name: "Sarah M.".to_string(),
        avatar_url: avatar("ffd300", "000", 100, 'S'),
        city: "Colombo".to_string(),
        crew: Some("Eco Warriors".to_string()),
        join_date: "March 2024".to_string(),
        total_cleanups: 12,
        total_likes: 156,
        total_points: 1240,
        rank: "Gold Cleaner".to_string(),
    }
}

#[must_use]
pub fn cleanup_history() -> Vec<CleanupHistoryEntry> {
    [
        ("1", "Mount Lavinia Beach", "2 hours ago", 24),
        ("2", "Viharamahadevi Park", "5 hours ago", 18),
        ("3", "Galle Face Green", "1 day ago", 32),
    ]
    .into_iter()
    .map(|(id, location, when, likes)| CleanupHistoryEntry {
        id: id.to_string(),
        before_photo: avatar("ff4444", "fff", 80, 'B'),
        after_photo: avatar("4CAF50", "fff", 80, 'A'),
        location: location.to_string(),
        when: when.to_string(),
        likes,
    })
    .collect()
}

#[must_use]
pub fn achievements() -> Vec<Achievement> {
    [
        ("1", "First Cleanup", "Complete your first cleanup", "star", true, 1, 1),
        ("2", "Beach Guardian", "Clean up 5 beach areas", "water", true, 5, 5),
        ("3", "Social Butterfly", "Get 100 likes on your posts", "heart", false, 156, 100),
        ("4", "Consistent Cleaner", "Complete 10 cleanups", "checkmark-circle", false, 12, 10),
    ]
    .into_iter()
    .map(
        |(id, title, description, icon, unlocked, progress, max_progress)| Achievement {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            unlocked,
            progress,
            max_progress,
        },
    )
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        date(2024, 3, 20)
    }

    #[test]
    fn test_feed_posts_are_newest_first() {
        let posts = feed_posts(now());
        assert_eq!(posts.len(), 3);
        assert!(posts.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(posts[0].author.name, "Sarah M.");
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(feed_posts(now()), feed_posts(now()));
        assert_eq!(locations(), locations());
        assert_eq!(comments("9", now()), comments("9", now()));
    }

    #[test]
    fn test_comments_reference_requested_post() {
        let list = comments("abc", now());
        assert!(!list.is_empty());
        assert!(list.iter().all(|c| c.post_id == "abc"));
        assert!(list.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn test_post_preview_reuses_demo_post() {
        assert_eq!(post_preview("2", now()).location, "Viharamahadevi Park, Colombo");
        assert_eq!(post_preview("zzz", now()).id, "zzz");
    }

    #[test]
    fn test_locations_cover_types() {
        let kinds: Vec<_> = locations().iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![LocationType::Beach, LocationType::Park, LocationType::Street]
        );
    }

    #[test]
    fn test_static_tables() {
        assert_eq!(challenges().len(), 4);
        assert_eq!(leaderboard()[0].rank, 1);
        assert_eq!(rewards().iter().filter(|r| r.unlocked).count(), 2);
        assert_eq!(achievements().len(), 4);
        assert_eq!(cleanup_history().len(), 3);
        assert_eq!(profile().rank, "Gold Cleaner");
    }
}
