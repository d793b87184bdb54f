//! Integration tests for `ApiClient` using wiremock HTTP mocks.

use rust_decimal::Decimal;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use envios_api::{ApiClient, ApiError, Catalogo, ModoBusqueda, SolicitudCotizacion};
use envios_core::{Cliente, Destino, Direccion};

fn test_client(base_url: &str) -> ApiClient {
    ApiClient::with_base_url(base_url, 30).expect("client construction should not fail")
}

fn destino_de_prueba(id: Option<i64>) -> Destino {
    Destino {
        id,
        cliente_id: Some(7),
        nombre: "Ana Torres".to_owned(),
        telefono: "3312345678".to_owned(),
        correo: None,
        direccion: Direccion {
            calle: "Av. Chapultepec".to_owned(),
            numero_ext: "15".to_owned(),
            codigo_postal: "44160".to_owned(),
            colonia: "Americana".to_owned(),
            ..Direccion::default()
        },
    }
}

#[tokio::test]
async fn buscar_codigo_postal_resuelve_colonias() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "zip_codes": [
            { "d_estado": "Jalisco", "d_mnpio": "Guadalajara", "d_ciudad": "Guadalajara", "d_asenta": "Americana" },
            { "d_estado": "Jalisco", "d_mnpio": "Guadalajara", "d_ciudad": "Guadalajara", "d_asenta": "Lafayette" }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/zip_codes.php"))
        .and(query_param("zip_code", "44160"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let direccion = client
        .buscar_codigo_postal("44160")
        .await
        .expect("should resolve postal code");

    assert_eq!(direccion.estado, "Jalisco");
    assert_eq!(direccion.municipio, "Guadalajara");
    assert_eq!(direccion.colonias, vec!["Americana", "Lafayette"]);
}

#[tokio::test]
async fn codigo_postal_desconocido_es_error_tipado() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/zip_codes.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "zip_codes": []
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.buscar_codigo_postal("99999").await.unwrap_err();
    assert!(matches!(err, ApiError::CodigoPostalNoEncontrado(ref cp) if cp == "99999"));
}

#[tokio::test]
async fn cotizar_parsea_servicios_y_cargos() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "exito": true,
        "servicios": [
            {
                "sku": "GDN03",
                "nombre": "Terrestre día siguiente",
                "precioBase": 290.0,
                "cargoSobrepeso": 0.0,
                "diasEstimados": 2,
                "precioConIva": 336.4,
                "esInternacional": false
            }
        ],
        "cargosAdicionales": { "empaque": 11.6, "seguro": 0, "recoleccion": 0, "reexpedicion": 0 },
        "iva": 0.16,
        "pesoTotal": 2.0,
        "pesoVolumetrico": 1.5,
        "pesoFacturable": 2.0
    });

    Mock::given(method("POST"))
        .and(path("/get-prices.php"))
        .and(body_partial_json(serde_json::json!({
            "tipoPaquete": "Paquete",
            "esInternacional": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let solicitud = SolicitudCotizacion {
        zona: None,
        codigo_postal_origen: Some("06600".to_owned()),
        codigo_postal_destino: Some("44160".to_owned()),
        tipo_paquete: "Paquete".to_owned(),
        peso: 2.0,
        peso_volumetrico: 1.5,
        es_internacional: false,
        valor_seguro: Decimal::ZERO,
        opcion_empaque: "EMP01".to_owned(),
        precio_empaque_personalizado: None,
        requiere_recoleccion: false,
        precio_recoleccion: None,
        requiere_reexpedicion: false,
    };
    let respuesta = client.cotizar(&solicitud).await.expect("should parse quote");

    assert_eq!(respuesta.servicios.len(), 1);
    assert_eq!(respuesta.servicios[0].sku, "GDN03");
    assert_eq!(respuesta.servicios[0].precio_con_iva, Decimal::new(3364, 1));
    assert_eq!(respuesta.iva, Some(Decimal::new(16, 2)));
    assert!((respuesta.peso_facturable - 2.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn cotizar_sin_exito_expone_el_mensaje_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/get-prices.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "exito": false,
            "error": "Zona no disponible para el CP indicado"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let solicitud = SolicitudCotizacion {
        zona: Some(3),
        codigo_postal_origen: None,
        codigo_postal_destino: None,
        tipo_paquete: "Sobre".to_owned(),
        peso: 0.5,
        peso_volumetrico: 0.0,
        es_internacional: true,
        valor_seguro: Decimal::ZERO,
        opcion_empaque: "EMP00".to_owned(),
        precio_empaque_personalizado: None,
        requiere_recoleccion: false,
        precio_recoleccion: None,
        requiere_reexpedicion: false,
    };
    let err = client.cotizar(&solicitud).await.unwrap_err();
    assert!(
        matches!(err, ApiError::Api(ref msg) if msg == "Zona no disponible para el CP indicado"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn login_devuelve_token_y_usuario() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login.php"))
        .and(body_partial_json(serde_json::json!({
            "credential": "operador",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "tok-123",
            "user": { "role": "admin", "username": "operador", "id": 9 }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let sesion = client.login("operador", "secreto").await.unwrap();
    assert_eq!(sesion.token, "tok-123");
    assert_eq!(sesion.user.role, "admin");
}

#[tokio::test]
async fn el_token_viaja_como_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clientes/7"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 7,
            "nombre": "Laura Méndez",
            "telefono": "5512345678",
            "codigo_postal": "06600",
            "colonia": "Juárez"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).con_token("tok-123");
    let cliente: Cliente = client.obtener(Catalogo::Clientes, 7).await.unwrap();
    assert_eq!(cliente.id, Some(7));
    assert_eq!(cliente.nombre, "Laura Méndez");
}

#[tokio::test]
async fn actualizar_destino_recibe_429_tipado() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/destinos/3"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("retry-after", "2"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .actualizar(Catalogo::Destinos, 3, &destino_de_prueba(Some(3)))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ApiError::RateLimited { retry_after_secs: 2 }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn tres_429_y_luego_200_con_reintentos() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/destinos/3"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(3)
        .mount(&server)
        .await;

    let actualizado = destino_de_prueba(Some(3));
    Mock::given(method("PUT"))
        .and(path("/destinos/3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::to_value(&actualizado).unwrap()),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    // Base 0 keeps the test fast; the schedule itself is covered in the
    // retry module's unit tests.
    let resultado: Destino = envios_api::retry_with_backoff(3, 0, || {
        client.actualizar(Catalogo::Destinos, 3, &actualizado)
    })
    .await
    .expect("fourth attempt should succeed");
    assert_eq!(resultado.id, Some(3));
}

#[tokio::test]
async fn busqueda_avanzada_envia_criterios_y_modo() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/clientes/search"))
        .and(body_partial_json(serde_json::json!({
            "criteria": { "codigo_postal": "06600" },
            "match": "any"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [],
            "total": 0
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let pagina = client
        .busqueda_avanzada::<Cliente>(
            Catalogo::Clientes,
            &[("codigo_postal", "06600")],
            ModoBusqueda::Cualquiera,
        )
        .await
        .unwrap();
    assert_eq!(pagina.total, 0);
}

#[tokio::test]
async fn reportar_desactualizado_descarta_el_eco() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/report-outdated"))
        .and(body_partial_json(serde_json::json!({
            "originZip": "06600",
            "destZip": "97203"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client
        .reportar_desactualizado(
            "06600",
            "97203",
            &serde_json::json!({ "reexpe": "No", "estafetaDeliveryDays": "9" }),
        )
        .await
        .expect("echo body must not be parsed as JSON");
}

#[tokio::test]
async fn frecuencia_entrega_con_error_en_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/delivery-frequency.php"))
        .and(query_param("postal_code", "99999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "CP fuera de cobertura"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.frecuencia_entrega("99999").await.unwrap_err();
    assert!(matches!(err, ApiError::Api(ref msg) if msg == "CP fuera de cobertura"));
}
