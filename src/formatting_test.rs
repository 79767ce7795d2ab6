use super::*;

#[test]
fn strip_formatting_keeps_digits() {
    assert_eq!(strip_formatting("(11) 98765-4321"), "11987654321");
    assert_eq!(strip_formatting("abc"), "");
}

#[test]
fn cnpj_full_and_partial() {
    assert_eq!(format_cnpj("11222333000181"), "11.222.333/0001-81");
    assert_eq!(format_cnpj("11.222.333/0001-81"), "11.222.333/0001-81");
    assert_eq!(format_cnpj("11"), "11");
    assert_eq!(format_cnpj("112"), "11.2");
    assert_eq!(format_cnpj("112223"), "11.222.3");
    assert_eq!(format_cnpj("112223330"), "11.222.333/0");
    assert_eq!(format_cnpj("1122233300018"), "11.222.333/0001-8");
}

#[test]
fn cnpj_too_long_is_unchanged() {
    assert_eq!(format_cnpj("112223330001811"), "112223330001811");
}

#[test]
fn cpf_full_and_partial() {
    assert_eq!(format_cpf("52998224725"), "529.982.247-25");
    assert_eq!(format_cpf("5299"), "529.9");
    assert_eq!(format_cpf("5299822"), "529.982.2");
    assert_eq!(format_cpf("529982247"), "529.982.247");
    assert_eq!(format_cpf("529982247251"), "529982247251");
}

#[test]
fn phone_mobile_and_landline() {
    assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
    assert_eq!(format_phone("1132654321"), "(11) 3265-4321");
}

#[test]
fn phone_partial_input() {
    assert_eq!(format_phone(""), "");
    assert_eq!(format_phone("1"), "(1");
    assert_eq!(format_phone("11"), "(11");
    assert_eq!(format_phone("119"), "(11) 9");
    assert_eq!(format_phone("119876"), "(11) 9876");
    assert_eq!(format_phone("1198765"), "(11) 98765-");
    assert_eq!(format_phone("119876543"), "(11) 98765-43");
}

#[test]
fn phone_non_digits_or_too_long_unchanged() {
    assert_eq!(format_phone("abc"), "abc");
    assert_eq!(format_phone("551198765432100"), "551198765432100");
}
