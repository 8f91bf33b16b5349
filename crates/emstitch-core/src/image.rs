use ndarray::Array2;

/// A single grayscale tile or section image.
/// Pixel values are f32 in [0.0, 1.0], row-major, shape = (height, width).
#[derive(Clone, Debug)]
pub struct Image {
    pub data: Array2<f32>,
}

impl Image {
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            data: Array2::<f32>::zeros((height, width)),
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// (height, width)
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn has_nan(&self) -> bool {
        self.data.iter().any(|v| v.is_nan())
    }

    /// Median sample value. Used to parameterise noise fill so padding
    /// matches the frequency content of the image body.
    pub fn median(&self) -> f32 {
        let mut values: Vec<f32> = self.data.iter().copied().collect();
        if values.is_empty() {
            return 0.0;
        }
        let mid = values.len() / 2;
        values.sort_by(|a, b| a.total_cmp(b));
        if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        }
    }

    /// Population standard deviation of the sample values.
    pub fn std_dev(&self) -> f32 {
        let n = self.data.len();
        if n == 0 {
            return 0.0;
        }
        let mean = self.data.iter().copied().sum::<f32>() / n as f32;
        let var = self
            .data
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f32>()
            / n as f32;
        var.sqrt()
    }
}
