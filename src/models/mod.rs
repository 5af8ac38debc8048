pub mod title;
pub mod user;

pub use title::{
    parse_genres, Enrichment, RatingLookup, Recommendations, SourceRating, Title, TitleDetail,
    TitleKind, TitlePage, TitleReviews,
};
pub use user::User;
