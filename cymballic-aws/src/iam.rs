//! IAM adapter for [`RolePolicies`].

use crate::traits::RolePolicies;
use crate::util::call_failed;
use async_trait::async_trait;
use aws_sdk_iam::Client;
use cymballic_core::{RemoteError, RemoteResult};

#[derive(Debug, Clone)]
pub struct IamRolePolicies {
    client: Client,
}

impl IamRolePolicies {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// IAM hands policy documents back URL-encoded.
fn decode_policy(encoded: &str) -> RemoteResult<String> {
    urlencoding::decode(encoded)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| RemoteError::call("GetRolePolicy", format!("undecodable policy document: {e}")))
}

#[async_trait]
impl RolePolicies for IamRolePolicies {
    async fn get_role_policy(&self, role: &str, policy_name: &str) -> RemoteResult<Option<String>> {
        let result = self
            .client
            .get_role_policy()
            .role_name(role)
            .policy_name(policy_name)
            .send()
            .await;
        match result {
            Ok(output) => decode_policy(output.policy_document()).map(Some),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_no_such_entity_exception() => Ok(None),
                _ => Err(call_failed("GetRolePolicy", &err)),
            },
        }
    }

    async fn put_role_policy(
        &self,
        role: &str,
        policy_name: &str,
        policy: &str,
    ) -> RemoteResult<()> {
        self.client
            .put_role_policy()
            .role_name(role)
            .policy_name(policy_name)
            .policy_document(policy)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) if service.is_no_such_entity_exception() => {
                    RemoteError::not_found(format!("role {role}"))
                }
                _ => call_failed("PutRolePolicy", &err),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_policy() {
        let encoded = "%7B%22Version%22%3A%222012-10-17%22%2C%22Statement%22%3A%5B%5D%7D";
        assert_eq!(
            decode_policy(encoded).unwrap(),
            r#"{"Version":"2012-10-17","Statement":[]}"#
        );
    }

    #[test]
    fn test_decode_plain_policy_is_unchanged() {
        let plain = r#"{"Version":"2012-10-17"}"#;
        assert_eq!(decode_policy(plain).unwrap(), plain);
    }
}
