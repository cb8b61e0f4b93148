use burn::prelude::*;
use burn::tensor::TensorData;

/// Converts observations into float tensors for burn models.
pub trait ToTensorF<const D: usize>: Clone {
    fn to_tensor<B: Backend>(self, device: &B::Device) -> Tensor<B, D>;
}

impl ToTensorF<1> for f32 {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 1> {
        Tensor::from_floats([self], device)
    }
}

impl ToTensorF<1> for Vec<f32> {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 1> {
        let n = self.len();

        Tensor::from_data(TensorData::new(self, [n]).convert::<B::FloatElem>(), device)
    }
}

impl ToTensorF<2> for Vec<Vec<f32>> {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 2> {
        let n0 = self.len();
        let n1 = self.first().map(Vec::len).unwrap_or(0);
        let data: Vec<f32> = self.concat();

        Tensor::from_data(
            TensorData::new(data, [n0, n1]).convert::<B::FloatElem>(),
            device,
        )
    }
}

/// The reverse direction, for turning model outputs into env actions.
pub trait FromTensorF<const D: usize>: Sized {
    fn from_tensor<B: Backend>(tensor: Tensor<B, D>) -> Self;
}

impl FromTensorF<1> for Vec<f32> {
    fn from_tensor<B: Backend>(tensor: Tensor<B, 1>) -> Self {
        tensor.into_data().convert::<f32>().iter::<f32>().collect()
    }
}

impl FromTensorF<2> for Vec<Vec<f32>> {
    fn from_tensor<B: Backend>(tensor: Tensor<B, 2>) -> Self {
        let [_, n1] = tensor.dims();
        let flat: Vec<f32> = tensor.into_data().convert::<f32>().iter::<f32>().collect();

        if n1 == 0 {
            return Vec::new();
        }

        flat.chunks(n1).map(<[f32]>::to_vec).collect()
    }
}

#[cfg(test)]
mod test {
    use assert_approx_eq::assert_approx_eq;
    use burn::{backend::NdArray, tensor::Tensor};

    use super::{FromTensorF, ToTensorF};

    #[test]
    fn test_to_tensor_f32() {
        let d: f32 = 1.1;
        let t: Tensor<NdArray, 1> = d.to_tensor(&Default::default());

        assert_eq!(t.shape().dims.len(), 1);
        assert_eq!(t.shape().dims, [1]);
        assert_eq!(t.into_scalar(), d);
    }

    #[test]
    fn test_to_tensor_vec_f32() {
        let d: Vec<f32> = vec![1.1, 2.2];
        let t: Tensor<NdArray, 1> = d.to_tensor(&Default::default());

        assert_eq!(t.shape().dims.len(), 1);
        assert_eq!(t.shape().dims, [2]);
    }

    #[test]
    fn test_to_tensor_vec_vec_f32() {
        let d: Vec<Vec<f32>> = vec![vec![1.1, 2.2], vec![3.3, 4.4], vec![1.0, 0.0]];
        let t: Tensor<NdArray, 2> = d.to_tensor(&Default::default());

        assert_eq!(t.shape().dims.len(), 2);
        assert_eq!(t.shape().dims, [3, 2]);
    }

    #[test]
    fn test_tensor_back_to_vec() {
        let d: Vec<Vec<f32>> = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let t: Tensor<NdArray, 2> = d.clone().to_tensor(&Default::default());
        let back = Vec::<Vec<f32>>::from_tensor(t);

        assert_eq!(back, d);

        let t: Tensor<NdArray, 1> = vec![0.5, -0.5].to_tensor(&Default::default());
        let back = Vec::<f32>::from_tensor(t * 2.0);

        assert_approx_eq!(back[0], 1.0);
        assert_approx_eq!(back[1], -1.0);
    }
}
