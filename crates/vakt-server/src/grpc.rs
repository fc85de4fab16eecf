use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use crate::identity::IdentityService;

pub mod proto {
    tonic::include_proto!("user");
}

use proto::user_service_server::{UserService, UserServiceServer};
use proto::{UserRequest, UserResponse, ValidateUserRequest, ValidateUserResponse};

/// gRPC adapter over the shared identity service. Like the REST handlers it
/// only ever serializes the scrubbed profile view, never the stored record.
pub struct UserGrpc {
    identity: IdentityService,
}

impl UserGrpc {
    pub fn new(identity: IdentityService) -> Self {
        Self { identity }
    }
}

#[tonic::async_trait]
impl UserService for UserGrpc {
    async fn get_user_data(
        &self,
        request: Request<UserRequest>,
    ) -> Result<Response<UserResponse>, Status> {
        let req = request.into_inner();
        match self.identity.profile_by_id(&req.user_id).await {
            Ok(Some(profile)) => Ok(Response::new(UserResponse {
                user_id: profile.id,
                username: profile.username,
                email: profile.email.unwrap_or_default(),
                address: profile.address.unwrap_or_default(),
                phone: profile.phone.unwrap_or_default(),
                role: profile.role.as_str().to_string(),
            })),
            Ok(None) => Err(Status::not_found(format!(
                "User not found with id: {}",
                req.user_id
            ))),
            Err(e) => {
                tracing::error!("Failed to get user: {:#}", e);
                Err(Status::internal("Internal error"))
            }
        }
    }

    async fn validate_user(
        &self,
        request: Request<ValidateUserRequest>,
    ) -> Result<Response<ValidateUserResponse>, Status> {
        let req = request.into_inner();
        match self
            .identity
            .validate_credentials(&req.username, &req.password)
            .await
        {
            // Both verdicts are normal responses; the peer reads `valid`.
            Ok(verdict) => Ok(Response::new(ValidateUserResponse {
                valid: verdict.valid,
                user_id: verdict.user_id.unwrap_or_default(),
                username: verdict.username.unwrap_or_default(),
                message: verdict.message,
            })),
            Err(e) => {
                tracing::error!("Credential validation error: {:#}", e);
                Err(Status::internal("Internal error"))
            }
        }
    }
}

/// Run the gRPC listener until the cancellation token fires.
pub async fn serve(
    identity: IdentityService,
    addr: SocketAddr,
    cancel: CancellationToken,
) -> Result<()> {
    tracing::info!("gRPC server listening on {}", addr);
    Server::builder()
        .add_service(UserServiceServer::new(UserGrpc::new(identity)))
        .serve_with_shutdown(addr, cancel.cancelled())
        .await
        .context("gRPC server error")?;
    Ok(())
}
