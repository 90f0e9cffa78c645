/// Grille d'orbites : une valeur d'itération par pixel, ordre ligne par
/// ligne, valeurs dans `[0, max_iterations - 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScalarGrid {
    width: u32,
    height: u32,
    data: Vec<u32>,
}

impl ScalarGrid {
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    pub fn from_data(width: u32, height: u32, data: Vec<u32>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize,
            "taille de la grille d'orbites invalide"
        );
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: u32) {
        self.data[y as usize * self.width as usize + x as usize] = value;
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Applique une transformation pure à chaque valeur.
    pub fn map_values(&self, f: impl Fn(u32) -> u32) -> ScalarGrid {
        ScalarGrid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

/// Grille de pixels RGB, même ordre ligne par ligne que [`ScalarGrid`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorGrid {
    width: u32,
    height: u32,
    data: Vec<[u8; 3]>,
}

impl ColorGrid {
    pub fn from_data(width: u32, height: u32, data: Vec<[u8; 3]>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize,
            "taille de la grille de pixels invalide"
        );
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn data(&self) -> &[[u8; 3]] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_indexing() {
        let mut grid = ScalarGrid::zeros(3, 2);
        grid.set(2, 1, 42);
        assert_eq!(grid.get(2, 1), 42);
        assert_eq!(grid.data()[5], 42);
    }

    #[test]
    #[should_panic]
    fn test_mismatched_size_panics() {
        let _ = ScalarGrid::from_data(2, 2, vec![0; 3]);
    }
}
