use super::*;

#[test]
fn new_surface_is_transparent() {
    let s = Surface::new(3, 2).unwrap();
    assert_eq!(s.data().len(), 3 * 2 * 4);
    assert!(s.data().iter().all(|&b| b == 0));
    assert_eq!(s.canvas(), Canvas { width: 3, height: 2 });
}

#[test]
fn zero_or_oversized_dims_are_layout_errors() {
    assert!(matches!(Surface::new(0, 10), Err(PinError::Layout(_))));
    assert!(matches!(Surface::new(10, 0), Err(PinError::Layout(_))));
    assert!(matches!(Surface::new(70_000, 1), Err(PinError::Layout(_))));
}

#[test]
fn pin_surface_has_fixed_resolution() {
    let s = Surface::pin().unwrap();
    assert_eq!((s.width(), s.height()), (1000, 1500));
}

#[test]
fn pixel_access_and_clear() {
    let mut s = Surface::new(2, 2).unwrap();
    s.data_mut()[4..8].copy_from_slice(&[10, 20, 30, 255]);
    assert_eq!(s.pixel(1, 0).unwrap().to_array(), [10, 20, 30, 255]);
    assert!(s.pixel(2, 0).is_none());
    s.clear();
    assert_eq!(s.pixel(1, 0).unwrap().to_array(), [0, 0, 0, 0]);
}

#[test]
fn straight_conversion_unpremultiplies() {
    let mut s = Surface::new(1, 1).unwrap();
    s.data_mut().copy_from_slice(&[64, 32, 0, 128]);
    assert_eq!(s.to_straight_rgba8(), vec![128, 64, 0, 128]);
}
