//! Shipment records.
//!
//! `MetodoCreacion` is modeled as a payload-bearing enum so the carrier
//! fields for one creation method cannot coexist with the other's. The wire
//! format is flat (`metodo_creacion` discriminator plus optional columns);
//! the bridge rejects flat records that mix fields from both methods or
//! omit a required one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::costos::DesgloseEnvio;
use crate::tracker::Persistible;

/// Shipment lifecycle. The happy path runs cotizado → preparacion →
/// transito → entregado; the remaining states are terminal exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstatusEnvio {
    Cotizado,
    Preparacion,
    Transito,
    Entregado,
    Devolucion,
    Cancelado,
    Incidencia,
}

impl std::fmt::Display for EstatusEnvio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EstatusEnvio::Cotizado => "cotizado",
            EstatusEnvio::Preparacion => "preparacion",
            EstatusEnvio::Transito => "transito",
            EstatusEnvio::Entregado => "entregado",
            EstatusEnvio::Devolucion => "devolucion",
            EstatusEnvio::Cancelado => "cancelado",
            EstatusEnvio::Incidencia => "incidencia",
        };
        write!(f, "{s}")
    }
}

/// How the shipment was created, with the fields each path mandates.
#[derive(Debug, Clone, PartialEq)]
pub enum MetodoCreacion {
    /// Label produced in-house.
    Interno,
    /// Outsourced label bought directly from another carrier.
    Externo {
        paqueteria_externa: String,
        numero_guia_externa: String,
        costo_neto: Decimal,
    },
    /// Rate and label obtained through the Manuable aggregator.
    Manuable {
        uuid_manuable: Uuid,
        servicio_manuable: String,
        etiqueta_url: String,
    },
}

impl MetodoCreacion {
    /// Wire value of the `metodo_creacion` discriminator.
    #[must_use]
    pub fn clave(&self) -> &'static str {
        match self {
            MetodoCreacion::Interno => "interno",
            MetodoCreacion::Externo { .. } => "externo",
            MetodoCreacion::Manuable { .. } => "manuable",
        }
    }
}

/// The durable transactional record linking customer, destination, selected
/// service and costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EnvioPlano", into = "EnvioPlano")]
pub struct Envio {
    pub id: Option<i64>,
    pub cliente_id: i64,
    pub destino_id: i64,
    /// SKU of the selected service line.
    pub servicio: String,
    pub contenido: String,
    pub costos: DesgloseEnvio,
    pub estatus: EstatusEnvio,
    pub metodo: MetodoCreacion,
    pub fecha_creacion: Option<DateTime<Utc>>,
}

impl Persistible for Envio {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

/// Violations of the creation-method field contract found while reading a
/// flat wire record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvioWireError {
    #[error("metodo_creacion desconocido: {0:?}")]
    MetodoDesconocido(String),

    #[error("campo requerido para metodo {metodo}: {campo}")]
    CampoFaltante {
        metodo: &'static str,
        campo: &'static str,
    },

    #[error("campo {campo} no permitido para metodo {metodo}")]
    CampoIncompatible {
        metodo: &'static str,
        campo: &'static str,
    },
}

/// Flat wire shape: discriminator string plus one optional column per
/// method-specific field.
#[derive(Serialize, Deserialize)]
struct EnvioPlano {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    cliente_id: i64,
    destino_id: i64,
    servicio: String,
    contenido: String,
    #[serde(flatten)]
    costos: DesgloseEnvio,
    estatus: EstatusEnvio,
    metodo_creacion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    paqueteria_externa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    numero_guia_externa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    costo_neto: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uuid_manuable: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    servicio_manuable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    etiqueta_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fecha_creacion: Option<DateTime<Utc>>,
}

fn requerido<T>(
    metodo: &'static str,
    campo: &'static str,
    valor: Option<T>,
) -> Result<T, EnvioWireError> {
    valor.ok_or(EnvioWireError::CampoFaltante { metodo, campo })
}

fn prohibido<T>(
    metodo: &'static str,
    campo: &'static str,
    valor: &Option<T>,
) -> Result<(), EnvioWireError> {
    if valor.is_some() {
        return Err(EnvioWireError::CampoIncompatible { metodo, campo });
    }
    Ok(())
}

impl TryFrom<EnvioPlano> for Envio {
    type Error = EnvioWireError;

    fn try_from(p: EnvioPlano) -> Result<Self, Self::Error> {
        let metodo = match p.metodo_creacion.as_str() {
            "interno" => {
                prohibido("interno", "paqueteria_externa", &p.paqueteria_externa)?;
                prohibido("interno", "numero_guia_externa", &p.numero_guia_externa)?;
                prohibido("interno", "costo_neto", &p.costo_neto)?;
                prohibido("interno", "uuid_manuable", &p.uuid_manuable)?;
                prohibido("interno", "servicio_manuable", &p.servicio_manuable)?;
                prohibido("interno", "etiqueta_url", &p.etiqueta_url)?;
                MetodoCreacion::Interno
            }
            "externo" => {
                prohibido("externo", "uuid_manuable", &p.uuid_manuable)?;
                prohibido("externo", "servicio_manuable", &p.servicio_manuable)?;
                prohibido("externo", "etiqueta_url", &p.etiqueta_url)?;
                MetodoCreacion::Externo {
                    paqueteria_externa: requerido(
                        "externo",
                        "paqueteria_externa",
                        p.paqueteria_externa,
                    )?,
                    numero_guia_externa: requerido(
                        "externo",
                        "numero_guia_externa",
                        p.numero_guia_externa,
                    )?,
                    costo_neto: requerido("externo", "costo_neto", p.costo_neto)?,
                }
            }
            "manuable" => {
                prohibido("manuable", "paqueteria_externa", &p.paqueteria_externa)?;
                prohibido("manuable", "numero_guia_externa", &p.numero_guia_externa)?;
                prohibido("manuable", "costo_neto", &p.costo_neto)?;
                MetodoCreacion::Manuable {
                    uuid_manuable: requerido("manuable", "uuid_manuable", p.uuid_manuable)?,
                    servicio_manuable: requerido(
                        "manuable",
                        "servicio_manuable",
                        p.servicio_manuable,
                    )?,
                    etiqueta_url: requerido("manuable", "etiqueta_url", p.etiqueta_url)?,
                }
            }
            otro => return Err(EnvioWireError::MetodoDesconocido(otro.to_owned())),
        };

        Ok(Envio {
            id: p.id,
            cliente_id: p.cliente_id,
            destino_id: p.destino_id,
            servicio: p.servicio,
            contenido: p.contenido,
            costos: p.costos,
            estatus: p.estatus,
            metodo,
            fecha_creacion: p.fecha_creacion,
        })
    }
}

impl From<Envio> for EnvioPlano {
    fn from(e: Envio) -> Self {
        let mut p = EnvioPlano {
            id: e.id,
            cliente_id: e.cliente_id,
            destino_id: e.destino_id,
            servicio: e.servicio,
            contenido: e.contenido,
            costos: e.costos,
            estatus: e.estatus,
            metodo_creacion: e.metodo.clave().to_owned(),
            paqueteria_externa: None,
            numero_guia_externa: None,
            costo_neto: None,
            uuid_manuable: None,
            servicio_manuable: None,
            etiqueta_url: None,
            fecha_creacion: e.fecha_creacion,
        };
        match e.metodo {
            MetodoCreacion::Interno => {}
            MetodoCreacion::Externo {
                paqueteria_externa,
                numero_guia_externa,
                costo_neto,
            } => {
                p.paqueteria_externa = Some(paqueteria_externa);
                p.numero_guia_externa = Some(numero_guia_externa);
                p.costo_neto = Some(costo_neto);
            }
            MetodoCreacion::Manuable {
                uuid_manuable,
                servicio_manuable,
                etiqueta_url,
            } => {
                p.uuid_manuable = Some(uuid_manuable);
                p.servicio_manuable = Some(servicio_manuable);
                p.etiqueta_url = Some(etiqueta_url);
            }
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costos::{desglose_envio, ComponentesCosto};

    fn envio_base(metodo: MetodoCreacion) -> Envio {
        let componentes = ComponentesCosto {
            envio: Decimal::from(350),
            seguro: Decimal::from(20),
            ..ComponentesCosto::default()
        };
        Envio {
            id: None,
            cliente_id: 7,
            destino_id: 21,
            servicio: "GDN03".to_owned(),
            contenido: "Documentos".to_owned(),
            costos: desglose_envio(&componentes, None, None),
            estatus: EstatusEnvio::Cotizado,
            metodo,
            fecha_creacion: None,
        }
    }

    #[test]
    fn externo_serializa_sus_campos_y_ninguno_de_manuable() {
        let envio = envio_base(MetodoCreacion::Externo {
            paqueteria_externa: "FedEx".to_owned(),
            numero_guia_externa: "FX123456".to_owned(),
            costo_neto: Decimal::from(280),
        });
        let v = serde_json::to_value(&envio).unwrap();
        assert_eq!(v["metodo_creacion"], "externo");
        assert_eq!(v["paqueteria_externa"], "FedEx");
        assert_eq!(v["numero_guia_externa"], "FX123456");
        assert!(v.get("uuid_manuable").is_none());
        assert!(v.get("servicio_manuable").is_none());
        assert!(v.get("etiqueta_url").is_none());

        let de: Envio = serde_json::from_value(v).unwrap();
        assert_eq!(de.metodo, envio.metodo);
    }

    #[test]
    fn interno_no_serializa_campos_de_terceros() {
        let v = serde_json::to_value(envio_base(MetodoCreacion::Interno)).unwrap();
        assert_eq!(v["metodo_creacion"], "interno");
        for campo in [
            "paqueteria_externa",
            "numero_guia_externa",
            "costo_neto",
            "uuid_manuable",
            "servicio_manuable",
            "etiqueta_url",
        ] {
            assert!(v.get(campo).is_none(), "{campo} must be absent");
        }
    }

    #[test]
    fn manuable_requiere_todos_sus_campos() {
        let envio = envio_base(MetodoCreacion::Manuable {
            uuid_manuable: Uuid::nil(),
            servicio_manuable: "express".to_owned(),
            etiqueta_url: "https://etiquetas.example/1.pdf".to_owned(),
        });
        let mut v = serde_json::to_value(&envio).unwrap();
        v.as_object_mut().unwrap().remove("etiqueta_url");
        let err = serde_json::from_value::<Envio>(v).unwrap_err();
        assert!(err.to_string().contains("etiqueta_url"), "got: {err}");
    }

    #[test]
    fn mezclar_metodos_se_rechaza() {
        let envio = envio_base(MetodoCreacion::Externo {
            paqueteria_externa: "DHL".to_owned(),
            numero_guia_externa: "DH987".to_owned(),
            costo_neto: Decimal::from(300),
        });
        let mut v = serde_json::to_value(&envio).unwrap();
        v.as_object_mut()
            .unwrap()
            .insert("uuid_manuable".to_owned(), serde_json::json!(Uuid::nil()));
        let err = serde_json::from_value::<Envio>(v).unwrap_err();
        assert!(err.to_string().contains("uuid_manuable"), "got: {err}");
    }

    #[test]
    fn metodo_desconocido_se_rechaza() {
        let mut v = serde_json::to_value(envio_base(MetodoCreacion::Interno)).unwrap();
        v.as_object_mut()
            .unwrap()
            .insert("metodo_creacion".to_owned(), "fax".into());
        assert!(serde_json::from_value::<Envio>(v).is_err());
    }

    #[test]
    fn estatus_usa_minusculas_en_el_json() {
        let v = serde_json::to_value(EstatusEnvio::Preparacion).unwrap();
        assert_eq!(v, "preparacion");
    }
}
