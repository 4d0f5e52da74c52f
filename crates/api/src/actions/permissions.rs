use orgadmin_auth::{Permission, Session, check_auth};
use orgadmin_infra::DirectoryStore;

use super::ActionResult;
use crate::context::AppState;

/// The seeded permission catalog.
pub async fn get_permissions(
    state: &AppState,
    session: Option<&Session>,
) -> ActionResult<Vec<Permission>> {
    check_auth(session, None)?;
    Ok(state.directory.list_permissions().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionError;
    use crate::actions::test_support::Harness;
    use orgadmin_auth::permissions::CATALOG;

    #[tokio::test]
    async fn lists_catalog_for_any_session() {
        let h = Harness::new().await;
        let anyone = h.user_with(&[]).await;

        let mut got = get_permissions(&h.state, Some(&anyone)).await.unwrap();
        got.sort();
        let mut expected = CATALOG.to_vec();
        expected.sort();
        assert_eq!(got, expected);

        assert!(matches!(
            get_permissions(&h.state, None).await,
            Err(ActionError::Unauthorized(_))
        ));
    }
}
