//! Global-context functions of the platform.
//!
//! A call to one of these names is a builtin call: it is kept as a bare
//! dependency and never resolves to a module function.

const GLOBAL_FUNCTIONS: &[(&str, &str)] = &[
    ("сообщить", "message"),
    ("предупреждение", "doMessageBox"),
    ("вопрос", "doQueryBox"),
    ("показатьпредупреждение", "showMessageBox"),
    ("показатьвопрос", "showQueryBox"),
    ("состояние", "status"),
    ("стрдлина", "strlen"),
    ("стрнайти", "strfind"),
    ("стрзаменить", "strreplace"),
    ("стршаблон", "strtemplate"),
    ("стрразделить", "strsplit"),
    ("стрсоединить", "strconcat"),
    ("стрначинаетсяс", "strstartswith"),
    ("стрзаканчиваетсяна", "strendswith"),
    ("стрчислострок", "strlinecount"),
    ("стрполучитьстроку", "strgetline"),
    ("стрчисловхождений", "stroccurrencecount"),
    ("стрсравнить", "strcompare"),
    ("найти", "find"),
    ("лев", "left"),
    ("прав", "right"),
    ("сред", "mid"),
    ("сокрл", "triml"),
    ("сокрп", "trimr"),
    ("сокрлп", "trimall"),
    ("врег", "upper"),
    ("нрег", "lower"),
    ("трег", "title"),
    ("символ", "char"),
    ("кодсимвола", "charcode"),
    ("пустаястрока", "isblankstring"),
    ("формат", "format"),
    ("нстр", "nstr"),
    ("строка", "string"),
    ("число", "number"),
    ("дата", "date"),
    ("булево", "boolean"),
    ("тип", "type"),
    ("типзнч", "typeof"),
    ("значениезаполнено", "valueisfilled"),
    ("заполнитьзначениясвойств", "fillpropertyvalues"),
    ("текущаядата", "currentdate"),
    ("текущаядатасеанса", "currentsessiondate"),
    ("год", "year"),
    ("месяц", "month"),
    ("день", "day"),
    ("час", "hour"),
    ("минута", "minute"),
    ("секунда", "second"),
    ("началодня", "begofday"),
    ("конецдня", "endofday"),
    ("началомесяца", "begofmonth"),
    ("конецмесяца", "endofmonth"),
    ("началогода", "begofyear"),
    ("конецгода", "endofyear"),
    ("добавитьмесяц", "addmonth"),
    ("мин", "min"),
    ("макс", "max"),
    ("окр", "round"),
    ("цел", "int"),
    ("abs", "abs"),
    ("sqrt", "sqrt"),
    ("pow", "pow"),
    ("вычислить", "eval"),
    ("выполнить", "execute"),
    ("описаниеошибки", "errordescription"),
    ("информацияобошибке", "errorinfo"),
    ("подробноепредставлениеошибки", "detailerrordescription"),
    ("краткоепредставлениеошибки", "brieferrordescription"),
    ("записьжурналарегистрации", "writelogevent"),
    ("предопределенноезначение", "predefinedvalue"),
    ("xmlстрока", "xmlstring"),
    ("xmlзначение", "xmlvalue"),
    ("xmlтип", "xmltype"),
    ("xmlтипзнч", "xmltypeof"),
    ("поместитьвовременноехранилище", "puttotempstorage"),
    ("получитьизвременногохранилища", "getfromtempstorage"),
    ("удалитьизвременногохранилища", "deletefromtempstorage"),
    ("установитьпривилегированныйрежим", "setprivilegedmode"),
    ("привилегированныйрежим", "privilegedmode"),
    ("рольдоступна", "isinrole"),
    ("пользователиинформационнойбазы", "infobaseusers"),
    ("имяпользователя", "username"),
    ("текущийрежимзапуска", "currentrunmode"),
    ("получитьфункциональнуюопцию", "getfunctionaloption"),
];

/// Whether `name` is a global-context function (case-insensitive).
pub fn is_global_function(name: &str) -> bool {
    let lower = name.to_lowercase();
    GLOBAL_FUNCTIONS
        .iter()
        .any(|(ru, en)| *ru == lower || en.eq_ignore_ascii_case(&lower))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_globals_in_both_languages() {
        assert!(is_global_function("Сообщить"));
        assert!(is_global_function("СТРДЛИНА"));
        assert!(is_global_function("Message"));
        assert!(is_global_function("ValueIsFilled"));
    }

    #[test]
    fn test_module_functions_are_not_globals() {
        assert!(!is_global_function("ЗаполнитьТаблицу"));
        assert!(!is_global_function("Foo"));
    }
}
