use crate::error::RelayError;
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    Client as OAuth2Client, ClientId, ClientSecret, EmptyExtraTokenFields, StandardRevocableToken,
    StandardTokenResponse, TokenUrl,
};

/// Standard OAuth2 token endpoint response.
pub(crate) type OauthTokenResponse = StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>;

/// A token-endpoint-only OAuth2 client.
///
/// The authorize flow happens out of band when the operator seeds the first refresh token, so
/// only the token URL is ever set.
pub(crate) type RefreshOauth2Client<
    HasAuthUrl = oauth2::EndpointNotSet,
    HasDeviceAuthUrl = oauth2::EndpointNotSet,
    HasIntrospectionUrl = oauth2::EndpointNotSet,
    HasRevocationUrl = oauth2::EndpointNotSet,
    HasTokenUrl = oauth2::EndpointSet,
> = OAuth2Client<
    BasicErrorResponse,
    OauthTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    HasAuthUrl,
    HasDeviceAuthUrl,
    HasIntrospectionUrl,
    HasRevocationUrl,
    HasTokenUrl,
>;

/// Build an OAuth2 client for the `refresh_token` grant.
pub(crate) fn build_oauth2_client(
    client_id: &str,
    client_secret: Option<&str>,
    token_url: &str,
) -> Result<RefreshOauth2Client, RelayError> {
    let mut client = OAuth2Client::<
        BasicErrorResponse,
        OauthTokenResponse,
        BasicTokenIntrospectionResponse,
        StandardRevocableToken,
        BasicRevocationErrorResponse,
    >::new(ClientId::new(client_id.to_string()));

    if let Some(secret) = client_secret.filter(|s| !s.is_empty()) {
        client = client.set_client_secret(ClientSecret::new(secret.to_string()));
    }

    Ok(client.set_token_uri(TokenUrl::new(token_url.to_string())?))
}
