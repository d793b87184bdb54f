//! Weight arithmetic: volumetric and billable weight.
//!
//! The server is authoritative for the final billable weight; these values
//! are computed locally for display and submitted alongside the quote
//! request as `pesoVolumetrico`.

/// Rounds up to 2 decimal places.
#[must_use]
pub fn ceil2(v: f64) -> f64 {
    (v * 100.0).ceil() / 100.0
}

/// Volumetric weight in kg for a package of `largo` × `ancho` × `alto` cm,
/// using the courier divisor of 5000.
#[must_use]
pub fn peso_volumetrico(largo: f64, ancho: f64, alto: f64) -> f64 {
    ceil2(largo * ancho * alto / 5000.0)
}

/// Billable weight: the greater of actual and volumetric weight.
#[must_use]
pub fn peso_facturable(peso: f64, volumetrico: f64) -> f64 {
    peso.max(volumetrico)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peso_volumetrico_caja_mediana() {
        // 30 × 25 × 10 / 5000 = 1.5 kg exactly.
        let v = peso_volumetrico(30.0, 25.0, 10.0);
        assert!((v - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn peso_volumetrico_redondea_hacia_arriba() {
        // 31 × 25 × 10 / 5000 = 1.55; 31 × 25 × 11 / 5000 = 1.705 → 1.71.
        let v = peso_volumetrico(31.0, 25.0, 11.0);
        assert!((v - 1.71).abs() < 1e-9, "got {v}");
    }

    #[test]
    fn peso_facturable_toma_el_mayor() {
        assert!((peso_facturable(2.0, 1.5) - 2.0).abs() < f64::EPSILON);
        assert!((peso_facturable(1.0, 1.5) - 1.5).abs() < f64::EPSILON);
    }
}
