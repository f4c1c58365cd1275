//! axum handlers, one per action
//!
//! Each handler reads its inputs from the request, calls the matching
//! [`ResourceService`] operation and wraps the result in an [`Envelope`].

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, Query, Request, State},
    http::request::Parts,
};

use super::descriptor::Resource;
use super::envelope::Envelope;
use super::error::{ApiError, ApiErrorKind};
use super::requests::{FilterRequest, IdRequest, PageRequest, PreloadQuery};
use super::service::ResourceService;
use crate::action::Action;
use crate::repository::ResourceRepository;

type Shared<M, R> = State<Arc<ResourceService<M, R>>>;
type IdPath = Result<Path<u64>, PathRejection>;
type HandlerResult = Result<Envelope, ApiError>;

fn path_id(id: IdPath, action: Action) -> Result<u64, ApiError> {
    id.map(|Path(id)| id).map_err(|rejection| {
        ApiError::new(ApiErrorKind::NotFound, format!("invalid id: {}", rejection.body_text()))
            .with_action(action)
    })
}

/// Split the request and read the whole body within the service's limit
async fn read_request<M, R>(
    service: &ResourceService<M, R>,
    request: Request,
    action: Action,
) -> Result<(Parts, axum::body::Bytes), ApiError>
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, service.settings().body_limit_bytes)
        .await
        .map_err(|e| ApiError::bad_request(format!("failed to read body: {}", e)).with_action(action))?;
    Ok((parts, bytes))
}

fn decode_json<T: serde::de::DeserializeOwned + Default>(
    bytes: &[u8],
    action: Action,
) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::bad_request(e.to_string()).with_action(action))
}

pub(crate) async fn get_by_id<M, R>(
    State(service): Shared<M, R>,
    id: IdPath,
    request: Request,
) -> HandlerResult
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let action = Action::GetById;
    let id = path_id(id, action)?;
    let (parts, bytes) = read_request(&service, request, action).await?;

    let mut id_request: IdRequest = decode_json(&bytes, action)?;
    if id_request.preloads.is_empty() {
        id_request.preloads = Query::<PreloadQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q.into_list())
            .unwrap_or_default();
    }
    id_request.id = id;

    let model = service.get_by_id(id_request).await?;
    Envelope::ok().with_data(service.descriptor().singular(), &model)
}

pub(crate) async fn first<M, R>(State(service): Shared<M, R>, request: Request) -> HandlerResult
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let action = Action::First;
    let (parts, bytes) = read_request(&service, request, action).await?;
    let FilterRequest { filters } = decode_json(&bytes, action)?;

    let model = service.first(filters, &parts).await?;
    Envelope::ok().with_data(service.descriptor().singular(), &model)
}

pub(crate) async fn list<M, R>(State(service): Shared<M, R>, request: Request) -> HandlerResult
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let action = Action::List;
    let (parts, bytes) = read_request(&service, request, action).await?;
    let FilterRequest { filters } = decode_json(&bytes, action)?;

    let models = service.list(filters, &parts).await?;
    Envelope::ok().with_data(service.descriptor().plural(), &models)
}

pub(crate) async fn page<M, R>(State(service): Shared<M, R>, request: Request) -> HandlerResult
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let action = Action::Page;
    let (parts, bytes) = read_request(&service, request, action).await?;
    let page_request: PageRequest = decode_json(&bytes, action)?;

    let page = service.page(page_request, &parts).await?;
    Envelope::ok()
        .with_data(service.descriptor().plural(), &page.items)?
        .with_data("pagination", &page.pagination)
}

pub(crate) async fn store<M, R>(State(service): Shared<M, R>, request: Request) -> HandlerResult
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let action = Action::Create;
    let (parts, bytes) = read_request(&service, request, action).await?;
    let model = service
        .descriptor()
        .decode(&bytes)
        .map_err(|e| e.with_action(action))?;

    let created = service.store(model, &parts).await?;
    Envelope::ok().with_data(service.descriptor().singular(), &created)
}

pub(crate) async fn update<M, R>(
    State(service): Shared<M, R>,
    id: IdPath,
    request: Request,
) -> HandlerResult
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let action = Action::Update;
    let id = path_id(id, action)?;
    let (parts, bytes) = read_request(&service, request, action).await?;
    let model = service
        .descriptor()
        .decode(&bytes)
        .map_err(|e| e.with_action(action))?;

    let updated = service.update(id, model, &parts).await?;
    Envelope::ok().with_data(service.descriptor().singular(), &updated)
}

pub(crate) async fn update_fields<M, R>(
    State(service): Shared<M, R>,
    id: IdPath,
    request: Request,
) -> HandlerResult
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let action = Action::UpdateFields;
    let id = path_id(id, action)?;
    let (parts, bytes) = read_request(&service, request, action).await?;
    let fields = service
        .descriptor()
        .decode_fields(&bytes)
        .map_err(|e| e.with_action(action))?;

    let base = service.update_fields(id, fields, &parts).await?;
    Envelope::ok().with_data(service.descriptor().singular(), &base)
}

pub(crate) async fn remove<M, R>(
    State(service): Shared<M, R>,
    id: IdPath,
    request: Request,
) -> HandlerResult
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let id = path_id(id, Action::Remove)?;
    let (parts, _body) = request.into_parts();

    let removed = service.remove(id, &parts).await?;
    Envelope::ok().with_data(service.descriptor().singular(), &removed)
}

pub(crate) async fn restore<M, R>(State(service): Shared<M, R>, id: IdPath) -> HandlerResult
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let id = path_id(id, Action::Restore)?;

    let restored = service.restore(id).await?;
    Envelope::ok().with_data(service.descriptor().singular(), &restored)
}

pub(crate) async fn destroy<M, R>(
    State(service): Shared<M, R>,
    id: IdPath,
    request: Request,
) -> HandlerResult
where
    M: Resource,
    R: ResourceRepository<M>,
{
    let id = path_id(id, Action::Destroy)?;
    let (parts, _body) = request.into_parts();

    service.destroy(id, &parts).await?;
    Ok(Envelope::ok())
}
