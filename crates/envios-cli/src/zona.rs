//! Postal-code lookup command: address data plus delivery frequency.

use envios_api::ApiClient;

pub async fn consultar(api: &ApiClient, codigo_postal: &str) -> anyhow::Result<()> {
    // Independent endpoints; fetch both at once.
    let (direccion, frecuencia) = futures::join!(
        api.buscar_codigo_postal(codigo_postal),
        api.frecuencia_entrega(codigo_postal)
    );

    let direccion = direccion?;
    println!("{codigo_postal}: {}, {}", direccion.municipio, direccion.estado);
    if !direccion.ciudad.is_empty() {
        println!("ciudad: {}", direccion.ciudad);
    }
    println!("colonias:");
    for colonia in &direccion.colonias {
        println!("  - {colonia}");
    }

    match frecuencia {
        Ok(f) => {
            let dias = [
                ("lun", f.lunes),
                ("mar", f.martes),
                ("mié", f.miercoles),
                ("jue", f.jueves),
                ("vie", f.viernes),
                ("sáb", f.sabado),
                ("dom", f.domingo),
            ];
            let cubiertos: Vec<&str> = dias
                .iter()
                .filter_map(|(nombre, cubre)| cubre.then_some(*nombre))
                .collect();
            println!("entrega: {}", cubiertos.join(", "));
            if let Some(frecuencia) = &f.frecuencia {
                println!("frecuencia: {frecuencia}");
            }
            if f.zona_extendida {
                println!("zona extendida");
            }
            if f.ocurre_forzoso {
                println!("ocurre forzoso: el paquete se recoge en sucursal");
            }
        }
        Err(e) => {
            // Address data alone is still useful; frequency is advisory.
            tracing::warn!(error = %e, "delivery frequency lookup failed");
        }
    }
    Ok(())
}
