//! Contact, listing, review and rental-request workflows driven against an
//! in-process stub of the backend services.

mod common {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use serde_json::Value;

    use rentify::clients::{HttpTransport, Service};
    use rentify::session::{SessionRecord, SessionStore, UserRole};

    pub(super) type Captured = Arc<Mutex<Vec<Value>>>;

    pub(super) async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub serves");
        });
        format!("http://{addr}/api")
    }

    pub(super) fn transport(service: Service, base_url: &str) -> HttpTransport {
        HttpTransport::new(service, base_url, None).expect("transport builds")
    }

    pub(super) fn logged_in(role: UserRole, user_id: i64, email: &str) -> SessionStore {
        let session = SessionStore::in_memory();
        session
            .write(&SessionRecord {
                logged_in: true,
                user_id: Some(user_id),
                email: Some(email.to_string()),
                role: Some(role),
            })
            .expect("session writable");
        session
    }

    pub(super) fn captured(captured: &Captured) -> Vec<Value> {
        captured.lock().expect("capture mutex").clone()
    }

    pub(super) fn property_json(id: i64, owner_email: &str) -> Value {
        serde_json::json!({
            "id": id,
            "codigo": format!("WEB-{id}"),
            "titulo": format!("Propiedad {id}"),
            "direccion": "Av. Siempre Viva 742",
            "precioMensual": 380000.0,
            "m2": 40.0,
            "nHabit": 1,
            "nBanos": 1,
            "tipoId": 1,
            "comunaId": 13,
            "propietarioEmail": owner_email
        })
    }
}

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use common::Captured;
use rentify::clients::{
    ContactClient, DocumentClient, PropertyClient, RentalRequestClient, Service,
};
use rentify::session::{SessionError, SessionStore, UserRole};
use rentify::workflows::contact::{self, ContactDraft};
use rentify::workflows::listings::{ListingDraft, ListingError, ListingManager};
use rentify::workflows::rental_requests::{self, RentalRequestError};
use rentify::workflows::{ContactError, DocumentReview};

fn contact_draft() -> ContactDraft {
    ContactDraft {
        first_name: "Camila".to_string(),
        last_names: "Soto".to_string(),
        email: "camila@correo.cl".to_string(),
        message: "Me interesa la casa en La Reina".to_string(),
        subject: None,
        phone: None,
    }
}

fn contact_stub(captured: Captured) -> Router {
    Router::new().route(
        "/api/contacto",
        post(move |Json(body): Json<Value>| {
            let captured = captured.clone();
            async move {
                captured.lock().expect("capture mutex").push(body.clone());
                let mut created = body;
                created["id"] = json!(31);
                (StatusCode::CREATED, Json(created))
            }
        }),
    )
}

#[tokio::test]
async fn contact_form_attaches_logged_in_user() {
    let captured = Captured::default();
    let base = common::spawn(contact_stub(captured.clone())).await;
    let client = ContactClient::new(common::transport(Service::Contact, &base));
    let session = common::logged_in(UserRole::Tenant, 44, "camila@correo.cl");

    let thanks = contact::send(&client, &session, &contact_draft())
        .await
        .expect("message sent");

    assert_eq!(thanks, "Gracias Camila Soto, tu mensaje ha sido enviado!");
    let sent = common::captured(&captured);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["nombre"], "Camila Soto");
    assert_eq!(sent[0]["asunto"], "Consulta desde formulario web");
    assert_eq!(sent[0]["usuarioId"], 44);
}

#[tokio::test]
async fn invalid_contact_form_never_reaches_the_service() {
    let captured = Captured::default();
    let base = common::spawn(contact_stub(captured.clone())).await;
    let client = ContactClient::new(common::transport(Service::Contact, &base));
    let mut draft = contact_draft();
    draft.message = "Hola".to_string();

    match contact::send(&client, &SessionStore::in_memory(), &draft).await {
        Err(ContactError::Invalid(errors)) => assert_eq!(
            errors.get("mensaje"),
            Some("El mensaje debe tener al menos 10 caracteres.")
        ),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(common::captured(&captured).is_empty());
}

fn listings_stub(updates: Captured) -> Router {
    Router::new()
        .route(
            "/api/propiedades",
            get(|| async {
                Json(json!([
                    common::property_json(1, "dueno@test.cl"),
                    common::property_json(2, "otra@test.cl"),
                    common::property_json(3, "DUENO@test.cl")
                ]))
            }),
        )
        .route(
            "/api/propiedades/:id",
            get(|Path(id): Path<i64>| async move {
                let owner = if id == 2 { "otra@test.cl" } else { "dueno@test.cl" };
                Json(common::property_json(id, owner))
            })
            .put(move |Path(id): Path<i64>, Json(body): Json<Value>| {
                let updates = updates.clone();
                async move {
                    updates.lock().expect("capture mutex").push(body.clone());
                    let mut updated = body;
                    updated["id"] = json!(id);
                    Json(updated)
                }
            }),
        )
}

#[tokio::test]
async fn owners_see_only_their_listings_and_admins_see_all() {
    let base = common::spawn(listings_stub(Captured::default())).await;
    let client = PropertyClient::new(common::transport(Service::Property, &base));

    let owner = ListingManager::new(
        client.clone(),
        common::logged_in(UserRole::Owner, 8, "dueno@test.cl"),
    );
    let ids: Vec<i64> = owner
        .list_for_session()
        .await
        .expect("owner listings")
        .iter()
        .map(|property| property.id)
        .collect();
    assert_eq!(ids, vec![1, 3]);

    let admin = ListingManager::new(client, common::logged_in(UserRole::Admin, 1, "admin@test.cl"));
    assert_eq!(admin.list_for_session().await.expect("all listings").len(), 3);
}

#[tokio::test]
async fn editing_someone_elses_listing_is_refused() {
    let updates = Captured::default();
    let base = common::spawn(listings_stub(updates.clone())).await;
    let manager = ListingManager::new(
        PropertyClient::new(common::transport(Service::Property, &base)),
        common::logged_in(UserRole::Owner, 8, "dueno@test.cl"),
    );
    let draft = ListingDraft {
        code: "WEB-2".to_string(),
        title: "Casa nueva".to_string(),
        address: "Los Leones 10".to_string(),
        monthly_price: 500_000.0,
        square_meters: 70.0,
        type_id: 1,
        comuna_id: 13,
        ..ListingDraft::default()
    };

    match manager.update(2, &draft).await {
        Err(err @ ListingError::NotPermitted { .. }) => {
            assert_eq!(err.to_string(), "No tienes permisos para editar esta propiedad")
        }
        other => panic!("expected permission failure, got {other:?}"),
    }
    assert!(common::captured(&updates).is_empty());

    let updated = manager.update(1, &draft).await.expect("own listing updates");
    assert_eq!(updated.title, "Casa nueva");
    let sent = common::captured(&updates);
    assert_eq!(sent[0]["propietarioId"], 8);
    assert_eq!(sent[0]["codigo"], "WEB-2");
}

#[tokio::test]
async fn tenants_cannot_manage_listings() {
    let base = common::spawn(listings_stub(Captured::default())).await;
    let manager = ListingManager::new(
        PropertyClient::new(common::transport(Service::Property, &base)),
        common::logged_in(UserRole::Tenant, 9, "inquilino@test.cl"),
    );

    match manager.list_for_session().await {
        Err(ListingError::Session(SessionError::Forbidden { required })) => {
            assert_eq!(required, UserRole::Owner)
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
}

fn document_json(id: i64, status_id: i64) -> Value {
    json!({
        "id": id,
        "nombre": format!("doc-{id}.pdf"),
        "usuarioId": 101,
        "estadoId": status_id,
        "tipoDocId": 1
    })
}

fn documents_stub(transitions: Captured) -> Router {
    Router::new()
        .route(
            "/api/documentos",
            get(|| async {
                Json(json!([
                    document_json(1, 1),
                    document_json(2, 2),
                    document_json(3, 1),
                    document_json(4, 3)
                ]))
            }),
        )
        .route(
            "/api/documentos/:id/estado/:status",
            patch(move |Path((id, status)): Path<(i64, i64)>| {
                let transitions = transitions.clone();
                async move {
                    transitions
                        .lock()
                        .expect("capture mutex")
                        .push(json!([id, status]));
                    Json(document_json(id, status))
                }
            }),
        )
}

#[tokio::test]
async fn review_queue_and_decisions() {
    let transitions = Captured::default();
    let base = common::spawn(documents_stub(transitions.clone())).await;
    let review = DocumentReview::new(
        DocumentClient::new(common::transport(Service::Document, &base)),
        common::logged_in(UserRole::Admin, 1, "admin@test.cl"),
    );

    let pending: Vec<i64> = review
        .pending_queue()
        .await
        .expect("queue loads")
        .iter()
        .map(|document| document.id)
        .collect();
    assert_eq!(pending, vec![1, 3]);

    let approved = review.approve(1).await.expect("approved");
    assert_eq!(approved.status_id, 2);

    assert!(review.reject(3, " mal ").await.is_err());
    let rejected = review
        .reject(3, "Documento ilegible")
        .await
        .expect("rejected");
    assert_eq!(rejected.status_id, 3);

    assert_eq!(
        common::captured(&transitions),
        vec![json!([1, 2]), json!([3, 3])]
    );
}

#[tokio::test]
async fn rental_request_rules_surface_verbatim() {
    let base = common::spawn(Router::new().route(
        "/api/solicitudes",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "El usuario ya tiene 3 solicitudes activas" })),
            )
        }),
    ))
    .await;
    let client = RentalRequestClient::new(common::transport(Service::Application, &base));
    let session = common::logged_in(UserRole::Tenant, 12, "inquilino@test.cl");

    match rental_requests::request_rental(&client, &session, 5).await {
        Err(err @ RentalRequestError::Service(_)) => {
            assert_eq!(err.to_string(), "El usuario ya tiene 3 solicitudes activas")
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    match rental_requests::request_rental(&client, &session, 0).await {
        Err(RentalRequestError::InvalidProperty) => {}
        other => panic!("expected invalid property, got {other:?}"),
    }

    match rental_requests::request_rental(&client, &SessionStore::in_memory(), 5).await {
        Err(RentalRequestError::Session(SessionError::NotLoggedIn)) => {}
        other => panic!("expected login requirement, got {other:?}"),
    }
}
