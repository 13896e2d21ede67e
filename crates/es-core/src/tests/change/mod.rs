mod change_record;
