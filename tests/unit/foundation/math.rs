use super::*;

#[test]
fn mul_div255_endpoints() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(255, 0), 0);
    assert_eq!(mul_div255_u8(0, 200), 0);
}

#[test]
fn mul_div255_rounds_to_nearest() {
    // 128 * 128 / 255 = 64.25
    assert_eq!(mul_div255_u8(128, 128), 64);
    // 200 * 51 / 255 = 40
    assert_eq!(mul_div255_u16(200, 51), 40);
}

#[test]
fn unit_to_u8_clamps() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(0.2), 51);
    assert_eq!(unit_to_u8(2.0), 255);
}

#[test]
fn add_saturates() {
    assert_eq!(add_sat_u8(200, 100), 255);
    assert_eq!(add_sat_u8(1, 2), 3);
}
