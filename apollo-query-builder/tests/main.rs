
pub(crate) const SOCIAL_SCHEMA: &str = include_str!("fixtures/social.graphql");
