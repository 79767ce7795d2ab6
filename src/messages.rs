//! User-facing messages (Portuguese, as shown by the portals).

pub const REQUIRED_EMAIL: &str = "Email é obrigatório";
pub const INVALID_EMAIL: &str = "Email inválido";
pub const REQUIRED_PASSWORD: &str = "Senha é obrigatória";
pub const PASSWORD_TOO_SHORT: &str = "Senha deve ter no mínimo 8 caracteres";
pub const PASSWORD_WEAK: &str = "Senha deve conter letras maiúsculas, minúsculas e números";
pub const PASSWORDS_DONT_MATCH: &str = "Senhas não conferem";
pub const FULL_NAME_TOO_SHORT: &str = "Nome completo é obrigatório (mínimo 3 caracteres)";
pub const CONTACT_NAME_TOO_SHORT: &str = "Nome do contato é obrigatório (mínimo 3 caracteres)";
pub const REQUIRED_PHONE: &str = "Telefone é obrigatório";
pub const INVALID_PHONE: &str = "Telefone deve ter entre 10 e 15 dígitos";
pub const REQUIRED_CNPJ: &str = "CNPJ é obrigatório";
pub const CNPJ_WRONG_LENGTH: &str = "CNPJ deve ter 14 dígitos";
pub const INVALID_CNPJ: &str = "CNPJ inválido";
pub const CPF_WRONG_LENGTH: &str = "CPF deve ter 11 dígitos";
pub const INVALID_CPF: &str = "CPF inválido";
pub const REQUIRED_FIELD: &str = "Este campo é obrigatório";
pub const INVALID_URL: &str = "URL inválida (ex: https://empresa.com.br)";
pub const COMPANY_NAME_TOO_SHORT: &str = "Nome da empresa é obrigatório (mínimo 3 caracteres)";
pub const INVALID_FIELD: &str = "Valor inválido";

pub const SERVER_ERROR: &str = "Erro ao processar requisição. Tente novamente.";
pub const NETWORK_ERROR: &str = "Erro de conexão. Verifique sua internet e tente novamente.";
pub const INVALID_CREDENTIALS: &str = "Email ou senha incorretos";
pub const RATE_LIMIT_EXCEEDED: &str = "Muitas tentativas. Aguarde alguns minutos e tente novamente.";
pub const FORBIDDEN: &str = "Você não tem permissão para realizar esta ação.";
pub const VALIDATION_FAILED: &str = "Verifique os campos destacados.";

pub const SHARE_LINK_FAILED: &str = "Erro ao gerar link";
pub const SHARING_TOGGLE_FAILED: &str = "Erro ao alterar compartilhamento";
pub const CONTACT_FAILED: &str = "Erro ao enviar mensagem";
pub const DUPLICATE_EMAIL: &str = "Este email já está cadastrado no sistema";
pub const CANDIDATE_CREATE_FAILED: &str = "Erro ao criar candidato. Tente novamente.";
pub const CSV_PARSE_FAILED: &str = "Erro ao processar CSV";
pub const CSV_WRONG_TYPE: &str = "Selecione um arquivo .csv";
pub const CSV_TOO_LARGE: &str = "Arquivo excede o limite de 10MB";
pub const IMPORT_START_FAILED: &str = "Erro ao iniciar importação";
pub const IMPORT_FAILED: &str = "Importação falhou. Tente novamente.";
