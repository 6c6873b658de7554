use crate::models::Post;

/// Feed served until posting is implemented.
pub fn sample_posts() -> Vec<Post> {
    vec![
        Post {
            id: 1,
            username: "coffeeexplorer".into(),
            shop_name: "Artisan Coffee Co".into(),
            location: "Downtown".into(),
            image_url: "/api/placeholder/400/400".into(),
            likes: 234,
            comments: 45,
            rating: 4.5,
            caption: "Perfect morning brew ☕️ The latte art here never disappoints! #coffeeart #morningcoffee".into(),
            drink_name: "Oat Milk Latte".into(),
            drink_price: 5.0,
        },
        Post {
            id: 2,
            username: "beanconnoisseur".into(),
            shop_name: "Roasters & Co".into(),
            location: "Westside".into(),
            image_url: "/api/placeholder/400/400".into(),
            likes: 156,
            comments: 28,
            rating: 5.0,
            caption: "Their new single-origin Ethiopian beans are incredible! Notes of blueberry and dark chocolate.".into(),
            drink_name: "Pour Over".into(),
            drink_price: 4.0,
        },
        Post {
            id: 3,
            username: "caffeinechaser".into(),
            shop_name: "The Coffee Lab".into(),
            location: "Arts District".into(),
            image_url: "/api/placeholder/400/400".into(),
            likes: 312,
            comments: 67,
            rating: 4.8,
            caption: "Found my new favorite spot! The atmosphere is perfect for working and the coffee is exceptional.".into(),
            drink_name: "Cortado".into(),
            drink_price: 3.0,
        },
    ]
}
