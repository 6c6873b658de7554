use coffeehaus_types::models::Post;

use crate::api::UserServiceClient;
use crate::error::Result;

/// Coffee cups shown under each post.
pub const RATING_CUPS: usize = 5;

pub async fn load_feed(client: &UserServiceClient, token: &str) -> Result<Vec<PostCard>> {
    let posts = client.feed(token).await?;
    Ok(posts.into_iter().map(PostCard::from).collect())
}

/// Display strings for one post in the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct PostCard {
    pub post: Post,
    pub avatar_initial: String,
    pub filled_cups: usize,
    pub likes: String,
    pub comments: String,
    pub drink: String,
}

impl From<Post> for PostCard {
    fn from(post: Post) -> Self {
        Self {
            avatar_initial: post
                .username
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_default(),
            filled_cups: filled_cups(post.rating),
            likes: format!("{} likes", post.likes),
            comments: format!("View all {} comments", post.comments),
            drink: format!("{} · {}", post.drink_name, format_price(post.drink_price)),
            post,
        }
    }
}

pub fn filled_cups(rating: f32) -> usize {
    (rating.round().max(0.0) as usize).min(RATING_CUPS)
}

pub fn format_price(price: f32) -> String {
    format!("${:.2}", price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffeehaus_types::feed::sample_posts;

    #[test]
    fn cards_for_sample_posts() {
        let cards: Vec<PostCard> = sample_posts().into_iter().map(PostCard::from).collect();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].avatar_initial, "C");
        assert!(cards[0].likes.ends_with(" likes"));
        assert!(cards[0].comments.starts_with("View all "));
    }

    #[test]
    fn rating_rounds_to_cups() {
        assert_eq!(filled_cups(4.5), 5);
        assert_eq!(filled_cups(4.4), 4);
        assert_eq!(filled_cups(0.2), 0);
        assert_eq!(filled_cups(7.0), 5);
    }

    #[test]
    fn price_has_two_decimals() {
        assert_eq!(format_price(4.5), "$4.50");
        assert_eq!(format_price(6.0), "$6.00");
    }
}
