use num_complex::Complex64;

use super::types::PlaneRegion;

/// Correspondance affine pixels <-> plan complexe.
///
/// L'axe imaginaire est inversé : la ligne 0 (haut de l'écran) correspond à
/// `im_max`, y croissant vers le bas comme en coordonnées écran.

/// Convertit une coordonnée pixel en point du plan complexe.
pub fn pixel_to_complex(x: u32, y: u32, region: &PlaneRegion, width: u32, height: u32) -> Complex64 {
    let re = region.re_min + (x as f64 / width as f64) * region.re_span();
    let im = region.im_max - (y as f64 / height as f64) * region.im_span();
    Complex64::new(re, im)
}

/// Convertit un point du plan complexe en coordonnée pixel (troncature vers
/// l'indice inférieur). Inverse de [`pixel_to_complex`] à un pixel près.
/// Consommé par les visualiseurs interactifs (sélection d'un point à
/// l'écran).
#[allow(dead_code)]
pub fn complex_to_pixel(
    re: f64,
    im: f64,
    region: &PlaneRegion,
    width: u32,
    height: u32,
) -> (u32, u32) {
    let x = ((re - region.re_min) / region.re_span() * width as f64).floor();
    let y = ((region.im_max - im) / region.im_span() * height as f64).floor();
    (
        (x.max(0.0) as u32).min(width.saturating_sub(1)),
        (y.max(0.0) as u32).min(height.saturating_sub(1)),
    )
}

/// Grille dense des points du plan, ligne par ligne, consommée par la
/// stratégie vectorisée.
pub fn complex_grid(region: &PlaneRegion, width: u32, height: u32) -> Vec<Complex64> {
    let mut grid = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            grid.push(pixel_to_complex(x, y, region, width, height));
        }
    }
    grid
}
