use crate::models::Post;

/// How many related posts the post page shows.
pub const RELATED_POSTS_LIMIT: usize = 3;

/// Returns the posts ordered most recent first. Posts published at the same
/// instant are ordered by slug so the result is deterministic.
pub fn list_by_recency(posts: &[Post]) -> Vec<Post> {
    let mut ordered = posts.to_vec();
    ordered.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.slug.cmp(&b.slug))
    });
    ordered
}

/// The `limit` most recent posts other than `current_slug`.
pub fn pick_related(posts: &[Post], current_slug: &str, limit: usize) -> Vec<Post> {
    let others: Vec<Post> = posts
        .iter()
        .filter(|post| post.slug != current_slug)
        .cloned()
        .collect();

    let mut related = list_by_recency(&others);
    related.truncate(limit);
    related
}

pub fn find_post<'a>(posts: &'a [Post], slug: &str) -> Option<&'a Post> {
    posts.iter().find(|post| post.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_published_at;

    fn post(slug: &str, date: &str) -> Post {
        Post::new(slug, parse_published_at(date).unwrap())
    }

    fn slugs(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    fn sample() -> Vec<Post> {
        vec![
            post("a", "2024-01-01"),
            post("b", "2024-03-01"),
            post("c", "2024-02-01"),
        ]
    }

    #[test]
    fn lists_most_recent_first() {
        let posts = sample();
        assert_eq!(slugs(&list_by_recency(&posts)), vec!["b", "c", "a"]);
        // input untouched
        assert_eq!(slugs(&posts), vec!["a", "b", "c"]);
    }

    #[test]
    fn listing_is_a_sorted_permutation() {
        let posts = vec![
            post("x", "2023-06-01"),
            post("y", "2025-01-15"),
            post("z", "2023-06-01"),
            post("w", "2024-12-31T23:59:59"),
            post("v", "2020-02-29"),
        ];
        let ordered = list_by_recency(&posts);

        let mut expected = slugs(&posts);
        let mut actual = slugs(&ordered);
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);

        for pair in ordered.windows(2) {
            assert!(pair[0].published_at >= pair[1].published_at);
        }
    }

    #[test]
    fn equal_dates_break_ties_by_slug() {
        let posts = vec![post("beta", "2024-05-05"), post("alpha", "2024-05-05")];
        assert_eq!(slugs(&list_by_recency(&posts)), vec!["alpha", "beta"]);
    }

    #[test]
    fn listing_is_idempotent() {
        let posts = vec![
            post("m", "2024-05-05"),
            post("k", "2024-05-05"),
            post("n", "2022-01-01"),
            post("o", "2026-01-01"),
        ];
        let once = list_by_recency(&posts);
        let twice = list_by_recency(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn picks_related_without_current_post() {
        let posts = sample();
        assert_eq!(slugs(&pick_related(&posts, "b", 2)), vec!["c", "a"]);
        assert_eq!(
            slugs(&pick_related(&posts, "c", RELATED_POSTS_LIMIT)),
            vec!["b", "a"]
        );
    }

    #[test]
    fn unmatched_slug_truncates_full_list() {
        let posts = sample();
        assert_eq!(slugs(&pick_related(&posts, "missing", 2)), vec!["b", "c"]);
    }

    #[test]
    fn related_length_matches_available_posts() {
        let posts: Vec<Post> = (1..=6)
            .map(|day| post(&format!("p{day}"), &format!("2024-01-0{day}")))
            .collect();

        for limit in 0..8 {
            for current in ["p3", "nope"] {
                let present = usize::from(find_post(&posts, current).is_some());
                let related = pick_related(&posts, current, limit);
                assert_eq!(related.len(), limit.min(posts.len() - present));
                assert!(related.iter().all(|p| p.slug != current));
            }
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(list_by_recency(&[]).is_empty());
        assert!(pick_related(&[], "a", RELATED_POSTS_LIMIT).is_empty());
        assert!(find_post(&[], "a").is_none());
    }

    #[test]
    fn finds_post_by_slug() {
        let posts = sample();
        assert_eq!(find_post(&posts, "c").map(|p| p.slug.as_str()), Some("c"));
        assert!(find_post(&posts, "d").is_none());
    }
}
