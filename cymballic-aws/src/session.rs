//! Profile-based AWS sessions.
//!
//! A session is only handed out after `GetCallerIdentity` succeeds, so an
//! expired SSO login surfaces before any resource is touched.

use crate::athena::AthenaCatalogs;
use crate::glue::GlueCatalog;
use crate::iam::IamRolePolicies;
use crate::s3::S3Storage;
use crate::traits::{
    CloudConnector, CloudSession, DataCatalogs, MetadataCatalog, ObjectStorage, RolePolicies,
};
use async_trait::async_trait;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::error::{DisplayErrorContext, SdkError};
use aws_types::os_shim_internal::{Env, Fs};
use cymballic_core::{GlobalConfig, SessionError};
use std::path::PathBuf;

/// Profile key holding the account an SSO profile logs into.
const SSO_ACCOUNT_ID: &str = "sso_account_id";

/// Opens sessions in a fixed region.
#[derive(Debug, Clone)]
pub struct AwsConnector {
    region: String,
    profile_files: ProfileFiles,
}

impl AwsConnector {
    pub fn new(global: &GlobalConfig) -> Self {
        Self {
            region: global.aws_region.clone(),
            profile_files: ProfileFiles::default(),
        }
    }

    /// Read profile account IDs from `path` only, instead of the default
    /// `$AWS_CONFIG_FILE` / `~/.aws/config` and credentials files.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.profile_files = ProfileFiles::builder()
            .with_file(ProfileFileKind::Config, path.into())
            .build();
        self
    }

    async fn load(&self, profile: &str) -> SdkConfig {
        aws_config::defaults(BehaviorVersion::latest())
            .profile_name(profile)
            .region(Region::new(self.region.clone()))
            .load()
            .await
    }
}

#[async_trait]
impl CloudConnector for AwsConnector {
    type Session = AwsSession;

    async fn connect(&self, profile: &str) -> Result<AwsSession, SessionError> {
        let sdk = self.load(profile).await;
        let identity = aws_sdk_sts::Client::new(&sdk)
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| {
                let detail = DisplayErrorContext(&err).to_string();
                match err {
                    SdkError::ServiceError(_) => SessionError::Expired {
                        profile: profile.to_string(),
                        detail,
                    },
                    _ => SessionError::NoActiveSession {
                        profile: profile.to_string(),
                        detail,
                    },
                }
            })?;
        let account_id = identity
            .account()
            .map(str::to_string)
            .ok_or_else(|| SessionError::AccountIdUnavailable {
                profile: profile.to_string(),
            })?;
        tracing::info!(profile, account_id = %account_id, "Verified session");

        Ok(AwsSession {
            account_id,
            s3: S3Storage::new(aws_sdk_s3::Client::new(&sdk), self.region.clone()),
            glue: GlueCatalog::new(aws_sdk_glue::Client::new(&sdk)),
            iam: IamRolePolicies::new(aws_sdk_iam::Client::new(&sdk)),
            athena: AthenaCatalogs::new(aws_sdk_athena::Client::new(&sdk)),
        })
    }

    async fn profile_account_id(&self, profile: &str) -> Result<String, SessionError> {
        sso_account_id(&Fs::real(), &Env::real(), &self.profile_files, profile).await
    }
}

/// Read `sso_account_id` of `profile` from the shared profile files. Works
/// without a live session for that profile.
async fn sso_account_id(
    fs: &Fs,
    env: &Env,
    files: &ProfileFiles,
    profile: &str,
) -> Result<String, SessionError> {
    let profiles = aws_config::profile::load(fs, env, files, None)
        .await
        .map_err(|err| SessionError::ProfileLoad {
            reason: DisplayErrorContext(&err).to_string(),
        })?;
    let section = profiles
        .get_profile(profile)
        .ok_or_else(|| SessionError::ProfileNotFound {
            profile: profile.to_string(),
        })?;
    section
        .get(SSO_ACCOUNT_ID)
        .filter(|account_id| !account_id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SessionError::AccountIdUnavailable {
            profile: profile.to_string(),
        })
}

/// Verified session holding one client per service.
#[derive(Debug, Clone)]
pub struct AwsSession {
    account_id: String,
    s3: S3Storage,
    glue: GlueCatalog,
    iam: IamRolePolicies,
    athena: AthenaCatalogs,
}

impl CloudSession for AwsSession {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn object_storage(&self) -> &dyn ObjectStorage {
        &self.s3
    }

    fn catalog(&self) -> &dyn MetadataCatalog {
        &self.glue
    }

    fn role_policies(&self) -> &dyn RolePolicies {
        &self.iam
    }

    fn data_catalogs(&self) -> &dyn DataCatalogs {
        &self.athena
    }
}
