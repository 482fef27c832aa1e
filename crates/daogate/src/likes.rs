//! Proposal "like" state and the write that changes it.

use std::fmt;

use daogate_mutation::{Toggle, ViewId};
use daogate_protocol::GraphQlRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Proposals as returned by the signed-in user's query.
pub const AUTHENTICATED_VIEW: ViewId = ViewId("proposals.authenticated");

/// Proposals as returned by the public query.
pub const PUBLIC_VIEW: ViewId = ViewId("proposals.public");

const SET_LIKE_MUTATION: &str = "mutation SetProposalLike($proposalId: ID!, $liked: Boolean!) { \
     setProposalLike(proposalId: $proposalId, liked: $liked) { liked likeCount } }";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(pub String);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProposalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The like-related part of a cached proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalLikes {
    pub liked: bool,
    pub like_count: u64,
}

impl Toggle for ProposalLikes {
    fn is_on(&self) -> bool {
        self.liked
    }

    fn toggled(&self, on: bool) -> Self {
        let like_count = match (self.liked, on) {
            (false, true) => self.like_count.saturating_add(1),
            (true, false) => self.like_count.saturating_sub(1),
            _ => self.like_count,
        };
        Self {
            liked: on,
            like_count,
        }
    }
}

pub(crate) fn set_like_request(id: &ProposalId, liked: bool) -> GraphQlRequest {
    GraphQlRequest::new(
        "SetProposalLike",
        SET_LIKE_MUTATION,
        json!({ "proposalId": id.0, "liked": liked }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggled_adjusts_count_only_on_change() {
        let likes = ProposalLikes {
            liked: false,
            like_count: 3,
        };

        assert_eq!(likes.toggled(true).like_count, 4);
        assert_eq!(likes.toggled(false), likes);
        assert_eq!(likes.toggled(true).toggled(false), likes);
    }

    #[test]
    fn test_unlike_never_underflows() {
        let likes = ProposalLikes {
            liked: true,
            like_count: 0,
        };

        assert_eq!(likes.toggled(false).like_count, 0);
    }

    #[test]
    fn test_set_like_request_variables() {
        let request = set_like_request(&ProposalId::from("p-1"), true);

        assert_eq!(request.operation_name.as_deref(), Some("SetProposalLike"));
        assert_eq!(request.variables["proposalId"], "p-1");
        assert_eq!(request.variables["liked"], true);
    }

    #[test]
    fn test_likes_deserialize_camel_case() {
        let likes: ProposalLikes = serde_json::from_str(r#"{ "liked": true, "likeCount": 9 }"#).unwrap();

        assert_eq!(likes, ProposalLikes { liked: true, like_count: 9 });
    }
}
